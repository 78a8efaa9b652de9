use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::Algorithm;
use jsonwebtoken::AlgorithmFamily;
use reqwest::Client;

use crate::error::Error;
use crate::error::Result;

const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_JWKS_REQUESTS_PER_MINUTE: u32 = 10;
const DEFAULT_ALGORITHMS: [Algorithm; 3] = [Algorithm::RS256, Algorithm::RS384, Algorithm::RS512];

/// Per-call expectations a token is checked against
///
/// Built fresh for every validation so that `now` reflects the time of the call.
#[derive(Debug, Clone)]
pub struct VerificationOptions {
    pub(crate) issuer: String,
    pub(crate) audience: String,
    /// Current time as a Unix timestamp
    pub(crate) now: i64,
    /// Algorithms a token header may name
    pub(crate) algorithms: Vec<Algorithm>,
}

impl VerificationOptions {
    /// Expect the given issuer and audience, trusting RS256/RS384/RS512 at the current time
    pub fn new(issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            now: Utc::now().timestamp(),
            algorithms: DEFAULT_ALGORITHMS.to_vec(),
        }
    }

    /// Override the time reference used for the expiry check
    pub fn with_current_time(mut self, now: i64) -> Self {
        self.now = now;
        self
    }

    /// Replace the list of trusted algorithms
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` if the list is empty or names an HMAC algorithm
    pub fn with_algorithms(mut self, algorithms: Vec<Algorithm>) -> Result<Self> {
        self.algorithms = checked_algorithms(algorithms)?;
        Ok(self)
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn now(&self) -> i64 {
        self.now
    }

    pub fn algorithms(&self) -> &[Algorithm] {
        &self.algorithms
    }
}

fn checked_algorithms(algorithms: Vec<Algorithm>) -> Result<Vec<Algorithm>> {
    if algorithms.is_empty() {
        return Err(Error::InvalidConfig(
            "at least one algorithm must be trusted".to_string(),
        ));
    }

    if let Some(hmac) = algorithms
        .iter()
        .find(|alg| AlgorithmFamily::Hmac.algorithms().contains(alg))
    {
        return Err(Error::InvalidConfig(format!(
            "symmetric algorithm {hmac:?} cannot be trusted for public key verification"
        )));
    }

    Ok(algorithms)
}

/// Configuration for the key store shared by all validation calls
#[derive(Debug, Clone)]
pub struct KeyStoreConfig {
    /// Upper bound for one key set fetch, connect to last body byte (default: 10 seconds)
    pub(crate) fetch_timeout: Duration,
    /// Outbound key set fetches allowed per minute and per URL (default: 10)
    pub(crate) requests_per_minute: u32,
    /// Optional custom HTTP client for fetching key sets
    /// If not provided, a default client will be created
    pub(crate) http_client: Option<Client>,
}

impl Default for KeyStoreConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            requests_per_minute: DEFAULT_JWKS_REQUESTS_PER_MINUTE,
            http_client: None,
        }
    }
}

impl KeyStoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the key set fetch timeout
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Set how many key set fetches per minute are allowed for each URL
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` if `requests_per_minute` is zero
    pub fn with_requests_per_minute(mut self, requests_per_minute: u32) -> Result<Self> {
        if requests_per_minute == 0 {
            return Err(Error::InvalidConfig(
                "requests_per_minute must be greater than zero".to_string(),
            ));
        }
        self.requests_per_minute = requests_per_minute;
        Ok(self)
    }

    /// Set a custom HTTP client
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    pub fn requests_per_minute(&self) -> u32 {
        self.requests_per_minute
    }
}

/// Configuration for a [`crate::JwtVerifier`] bound to one identity provider
#[derive(Debug, Clone)]
pub struct JwtVerifierConfig {
    /// URL of the published key set
    pub(crate) jwks_url: String,
    /// The expected issuer of the JWT tokens
    pub(crate) expected_issuer: String,
    /// The audience the token must be intended for
    pub(crate) expected_audience: String,
    pub(crate) algorithms: Vec<Algorithm>,
    pub(crate) key_store: KeyStoreConfig,
}

impl JwtVerifierConfig {
    /// Create a new configuration for the given key set URL, issuer and audience
    pub fn new(
        jwks_url: impl Into<String>,
        expected_issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        Self {
            jwks_url: jwks_url.into(),
            expected_issuer: expected_issuer.into(),
            expected_audience: audience.into(),
            algorithms: DEFAULT_ALGORITHMS.to_vec(),
            key_store: KeyStoreConfig::default(),
        }
    }

    /// Configuration for tokens issued by an Amazon Cognito user pool
    ///
    /// Cognito ID tokens carry the app client id as their audience.
    pub fn for_cognito_user_pool(
        region: &str,
        user_pool_id: &str,
        client_id: impl Into<String>,
    ) -> Self {
        let issuer = format!("https://cognito-idp.{region}.amazonaws.com/{user_pool_id}");
        let jwks_url = format!("{issuer}/.well-known/jwks.json");
        Self::new(jwks_url, issuer, client_id)
    }

    /// Replace the list of trusted algorithms
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` if the list is empty or names an HMAC algorithm
    pub fn with_algorithms(mut self, algorithms: Vec<Algorithm>) -> Result<Self> {
        self.algorithms = checked_algorithms(algorithms)?;
        Ok(self)
    }

    /// Set the configuration of the key store the verifier creates
    pub fn with_key_store_config(mut self, key_store: KeyStoreConfig) -> Self {
        self.key_store = key_store;
        self
    }

    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    pub fn expected_issuer(&self) -> &str {
        &self.expected_issuer
    }

    pub fn expected_audience(&self) -> &str {
        &self.expected_audience
    }

    /// Options for one validation call made now
    pub(crate) fn verification_options(&self) -> VerificationOptions {
        VerificationOptions {
            algorithms: self.algorithms.clone(),
            ..VerificationOptions::new(&self.expected_issuer, &self.expected_audience)
        }
    }
}
