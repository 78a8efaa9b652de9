use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::claims::Claims;
use crate::config::JwtVerifierConfig;
use crate::config::VerificationOptions;
use crate::decoder::decode;
use crate::error::Error;
use crate::error::Result;
use crate::jwks_cache::KeyStore;
use crate::validation::verify;

/// Trait for JWT verification
#[async_trait]
pub trait VerifyJwt {
    /// Verify a JWT token and return its claims
    async fn verify(&self, token: &str) -> Result<Claims>;
}

/// Validate `token` against the key set at `jwks_url`
///
/// Decodes the token, resolves its `kid` through `key_store` and verifies signature and
/// claims. Any failure is returned as is; there is no retry.
pub async fn validate(
    key_store: &KeyStore,
    token: &str,
    jwks_url: &str,
    options: &VerificationOptions,
) -> Result<Claims> {
    let decoded = decode(token)?;
    let kid = decoded.header.kid.as_deref().ok_or(Error::KeyIdMissing)?;

    let key = key_store.get_signing_key(jwks_url, kid).await?;
    let claims = verify(&decoded, &key, options)?;

    debug!(kid, alg = %decoded.header.alg, sub = ?claims.sub(), "Token validated");

    Ok(claims)
}

/// JWT verifier bound to one identity provider
///
/// Owns (or shares) a [`KeyStore`]; build it once and reuse it for every request.
pub struct JwtVerifier {
    key_store: Arc<KeyStore>,
    config: JwtVerifierConfig,
}

impl JwtVerifier {
    /// Create a new JWT verifier with its own key store
    pub fn new(config: JwtVerifierConfig) -> Self {
        let key_store = Arc::new(KeyStore::new(config.key_store.clone()));
        Self::with_key_store(config, key_store)
    }

    /// Create a JWT verifier that resolves keys through a shared key store
    pub fn with_key_store(config: JwtVerifierConfig, key_store: Arc<KeyStore>) -> Self {
        Self { key_store, config }
    }

    pub fn key_store(&self) -> &Arc<KeyStore> {
        &self.key_store
    }

    pub fn config(&self) -> &JwtVerifierConfig {
        &self.config
    }
}

#[async_trait]
impl VerifyJwt for JwtVerifier {
    async fn verify(&self, token: &str) -> Result<Claims> {
        let options = self.config.verification_options();

        validate(&self.key_store, token, &self.config.jwks_url, &options)
            .await
            .inspect_err(|e| debug!(kind = %e.kind(), error = %e, "Token rejected"))
    }
}
