//! Structural parsing of compact tokens
//!
//! Nothing decoded here is trusted: the header is only used to pick a key and an
//! algorithm, and the payload stays inside the [`DecodedToken`] until the signature
//! has been checked.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::claims::Claims;
use crate::error::Error;
use crate::error::Result;

/// JOSE header of a token
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenHeader {
    /// Algorithm name exactly as written by the issuer, `"none"` included; empty when absent
    #[serde(default)]
    pub alg: String,
    pub kid: Option<String>,
    pub typ: Option<String>,
}

/// A token split into its parts, with header and payload decoded but not verified
#[derive(Debug, Clone)]
pub struct DecodedToken {
    pub header: TokenHeader,
    pub(crate) payload: Claims,
    signing_input: String,
    signature: String,
}

impl DecodedToken {
    /// `base64url(header) "." base64url(payload)`, the bytes covered by the signature
    pub fn signing_input(&self) -> &str {
        &self.signing_input
    }

    /// The base64url encoded signature segment
    pub fn signature(&self) -> &str {
        &self.signature
    }
}

/// Split a compact token into header, payload and signature
///
/// # Errors
/// Returns `Error::MalformedToken` unless the token has exactly three non-empty
/// segments and both header and payload are base64url encoded JSON objects.
pub fn decode(token: &str) -> Result<DecodedToken> {
    let segments: Vec<&str> = token.split('.').collect();

    let [header, payload, signature] = segments.as_slice() else {
        return Err(Error::MalformedToken(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    };

    if header.is_empty() || payload.is_empty() || signature.is_empty() {
        return Err(Error::MalformedToken("empty segment".to_string()));
    }

    Ok(DecodedToken {
        header: decode_segment(header, "header")?,
        payload: decode_segment(payload, "payload")?,
        signing_input: format!("{header}.{payload}"),
        signature: signature.to_string(),
    })
}

fn decode_segment<T: DeserializeOwned>(segment: &str, name: &str) -> Result<T> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| Error::MalformedToken(format!("{name} is not base64url: {e}")))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| Error::MalformedToken(format!("{name} is not a JSON object: {e}")))
}
