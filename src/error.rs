use std::fmt;
use std::fmt::Debug;
use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed token: {0}")]
    MalformedToken(String),
    #[error("Missing 'kid' in the header of the provided JWT")]
    KeyIdMissing,
    #[error("Failed to retrieve signing keys: {0}")]
    KeyRetrieval(String),
    #[error("Fetching the key set from {jwks_url} was refused by the outbound rate limiter")]
    RateLimited { jwks_url: String },
    #[error("Signing key with kid '{0}' was not found in the key set")]
    SigningKeyNotFound(String),
    #[error("Algorithm not accepted for this token: {0}")]
    AlgorithmMismatch(String),
    #[error("The signature of the provided JWT is invalid")]
    SignatureInvalid,
    #[error("The provided JWT has expired. Expiration timestamp: {0:?}")]
    TokenExpired(Option<i64>),
    #[error("The provided JWT does not match the expected issuer. Provided issuer: {0:?}")]
    IssuerMismatch(Option<String>),
    #[error("The provided JWT is not intended for the expected audience")]
    AudienceMismatch,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Stable classification of a rejection, one per failure family a caller may branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedToken,
    KeyRetrievalFailure,
    SigningKeyNotFound,
    AlgorithmMismatch,
    SignatureInvalid,
    TokenExpired,
    IssuerMismatch,
    AudienceMismatch,
    InvalidConfig,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MalformedToken => "malformed-token",
            ErrorKind::KeyRetrievalFailure => "key-retrieval-failure",
            ErrorKind::SigningKeyNotFound => "signing-key-not-found",
            ErrorKind::AlgorithmMismatch => "algorithm-mismatch",
            ErrorKind::SignatureInvalid => "signature-invalid",
            ErrorKind::TokenExpired => "token-expired",
            ErrorKind::IssuerMismatch => "issuer-mismatch",
            ErrorKind::AudienceMismatch => "audience-mismatch",
            ErrorKind::InvalidConfig => "invalid-config",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MalformedToken(_) => ErrorKind::MalformedToken,
            Error::KeyIdMissing | Error::SigningKeyNotFound(_) => ErrorKind::SigningKeyNotFound,
            Error::KeyRetrieval(_) | Error::RateLimited { .. } => ErrorKind::KeyRetrievalFailure,
            Error::AlgorithmMismatch(_) => ErrorKind::AlgorithmMismatch,
            Error::SignatureInvalid => ErrorKind::SignatureInvalid,
            Error::TokenExpired(_) => ErrorKind::TokenExpired,
            Error::IssuerMismatch(_) => ErrorKind::IssuerMismatch,
            Error::AudienceMismatch => ErrorKind::AudienceMismatch,
            Error::InvalidConfig(_) => ErrorKind::InvalidConfig,
        }
    }
}

pub(crate) fn fetch_jwks_error(error: reqwest::Error) -> Error {
    Error::KeyRetrieval(format!("Failed to fetch JWKS: {error}"))
}

pub(crate) fn parse_jwks_error(error: reqwest::Error) -> Error {
    Error::KeyRetrieval(format!("Failed to parse JWKS: {error}"))
}

pub(crate) fn timeout_error(jwks_url: &str, timeout: Duration) -> Error {
    Error::KeyRetrieval(format!(
        "Fetching JWKS from {jwks_url} timed out after {}ms",
        timeout.as_millis()
    ))
}
