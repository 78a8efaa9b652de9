//! # edge-jwt
//!
//! Validation of signed bearer tokens (JWTs) against a remotely published JSON Web Key Set.
//!
//! This library is designed for request-authorization handlers running in short-lived,
//! reused execution environments: the [`KeyStore`] is created once per process and keeps
//! every resolved signing key for the lifetime of that process, so most validations never
//! touch the network.
//!
//! ## Features
//!
//! - Structural token decoding without trust ([`decoder::decode`])
//! - Signing key resolution by `kid`, from RSA components, EC points or `x5c` certificates
//! - Append-only key cache, one per key set URL, with single-flight fetches
//! - Rate limited and time bounded key set fetches
//! - Algorithm allow-listing (never `none`, never HMAC), issuer, audience and expiry checks
//! - Typed failures mapped onto a stable [`ErrorKind`] taxonomy
//!
//! ## Example
//!
//! ```rust,no_run
//! use edge_jwt::{JwtVerifier, JwtVerifierConfig, VerifyJwt};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = JwtVerifierConfig::for_cognito_user_pool(
//!         "us-east-1",
//!         "us-east-1_example",
//!         "my-app-client-id",
//!     );
//!
//!     let verifier = JwtVerifier::new(config);
//!
//!     let token = "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9...";
//!     let claims = verifier.verify(token).await?;
//!
//!     println!("Subject: {:?}", claims.sub());
//!
//!     Ok(())
//! }
//! ```

mod claims;
mod config;
pub mod decoder;
mod error;
mod jwks_cache;
mod signing_key;
pub mod validation;
mod verifier;

// Re-exports for public API
pub use claims::Audience;
pub use claims::Claims;
pub use config::JwtVerifierConfig;
pub use config::KeyStoreConfig;
pub use config::VerificationOptions;
pub use decoder::DecodedToken;
pub use decoder::TokenHeader;
pub use error::Error;
pub use error::ErrorKind;
pub use error::Result;
pub use jsonwebtoken::Algorithm;
pub use jwks_cache::KeySetCache;
pub use jwks_cache::KeyStore;
pub use signing_key::KeyMaterial;
pub use signing_key::SigningKey;
pub use verifier::validate;
pub use verifier::JwtVerifier;
pub use verifier::VerifyJwt;
