//! Signature and claim checks for a decoded token
//!
//! Order matters: the algorithm is vetted before any cryptography runs, and claims are
//! only looked at once the signature has been verified against the resolved key.

use std::str::FromStr;

use jsonwebtoken::crypto;
use jsonwebtoken::Algorithm;

use crate::claims::Claims;
use crate::config::VerificationOptions;
use crate::decoder::DecodedToken;
use crate::error::Error;
use crate::error::Result;
use crate::signing_key::SigningKey;

/// Verify `token` with `key` and check its expiry, issuer and audience
///
/// # Errors
/// - `Error::AlgorithmMismatch` if the header algorithm is missing, unknown, `none`, not trusted
///   by `options` or not usable with the key's family
/// - `Error::SignatureInvalid` if the signature does not verify
/// - `Error::TokenExpired` if `exp` is missing or not strictly after `options.now`
/// - `Error::IssuerMismatch` if `iss` differs from the expected issuer
/// - `Error::AudienceMismatch` if `aud` neither equals nor contains the expected audience
pub fn verify(
    token: &DecodedToken,
    key: &SigningKey,
    options: &VerificationOptions,
) -> Result<Claims> {
    let algorithm = checked_algorithm(&token.header.alg, key, options)?;

    let signature_ok = crypto::verify(
        token.signature(),
        token.signing_input().as_bytes(),
        key.decoding_key(),
        algorithm,
    )
    .unwrap_or(false);

    if !signature_ok {
        return Err(Error::SignatureInvalid);
    }

    validate_claims(&token.payload, options)?;

    Ok(token.payload.clone())
}

fn checked_algorithm(
    alg: &str,
    key: &SigningKey,
    options: &VerificationOptions,
) -> Result<Algorithm> {
    if alg.is_empty() {
        return Err(Error::AlgorithmMismatch(
            "token header does not name an algorithm".to_string(),
        ));
    }

    let algorithm = Algorithm::from_str(alg)
        .map_err(|_| Error::AlgorithmMismatch(format!("unsupported algorithm '{alg}'")))?;

    if !options.algorithms.contains(&algorithm) {
        return Err(Error::AlgorithmMismatch(format!(
            "{alg} is not a trusted algorithm"
        )));
    }

    if !key.family().algorithms().contains(&algorithm) {
        return Err(Error::AlgorithmMismatch(format!(
            "{alg} cannot be used with {:?} key '{}'",
            key.family(),
            key.kid()
        )));
    }

    Ok(algorithm)
}

fn validate_claims(claims: &Claims, options: &VerificationOptions) -> Result<()> {
    match claims.exp() {
        Some(exp) if exp > options.now => {}
        exp => return Err(Error::TokenExpired(exp)),
    }

    if claims.iss() != Some(options.issuer.as_str()) {
        return Err(Error::IssuerMismatch(claims.iss().map(str::to_string)));
    }

    if !claims.aud().is_some_and(|aud| aud.contains(&options.audience)) {
        return Err(Error::AudienceMismatch);
    }

    Ok(())
}
