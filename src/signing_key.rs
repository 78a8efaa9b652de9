use base64::engine::general_purpose::STANDARD;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::jwk::AlgorithmParameters;
use jsonwebtoken::jwk::EllipticCurveKeyParameters;
use jsonwebtoken::jwk::Jwk;
use jsonwebtoken::jwk::PublicKeyUse;
use jsonwebtoken::jwk::RSAKeyParameters;
use jsonwebtoken::AlgorithmFamily;
use jsonwebtoken::DecodingKey;
use x509_parser::prelude::FromDer;
use x509_parser::prelude::X509Certificate;
use x509_parser::public_key::PublicKey;

/// Public key material, tagged by the representation it was published in
#[derive(Debug, Clone)]
pub enum KeyMaterial {
    /// RSA modulus/exponent pair from the JWK itself
    Rsa(DecodingKey),
    /// Elliptic curve point from the JWK itself
    EllipticCurve(DecodingKey),
    /// Public key of the leaf certificate in the JWK's `x5c` chain
    Certificate(DecodingKey),
}

/// A verification key resolved from a key set
#[derive(Debug, Clone)]
pub struct SigningKey {
    kid: String,
    material: KeyMaterial,
}

impl SigningKey {
    pub fn new(kid: impl Into<String>, material: KeyMaterial) -> Self {
        Self {
            kid: kid.into(),
            material,
        }
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn material(&self) -> &KeyMaterial {
        &self.material
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        match &self.material {
            KeyMaterial::Rsa(key)
            | KeyMaterial::EllipticCurve(key)
            | KeyMaterial::Certificate(key) => key,
        }
    }

    /// Algorithm family the key can verify, RSA or EC
    pub fn family(&self) -> AlgorithmFamily {
        self.decoding_key().family()
    }

    /// Normalize a published JWK into a signing key
    ///
    /// A certificate chain takes precedence over inline components. Keys that cannot
    /// verify signatures (no `kid`, encryption-only, symmetric or OKP) are rejected with
    /// a reason so the caller can skip them.
    pub(crate) fn from_jwk(jwk: &Jwk) -> Result<Self, String> {
        let kid = jwk
            .common
            .key_id
            .clone()
            .ok_or_else(|| "key has no kid".to_string())?;

        if matches!(jwk.common.public_key_use, Some(PublicKeyUse::Encryption)) {
            return Err("key is published for encryption".to_string());
        }

        if let Some(leaf) = jwk.common.x509_chain.as_ref().and_then(|chain| chain.first()) {
            let key = decoding_key_from_certificate(leaf)?;
            return Ok(Self::new(kid, KeyMaterial::Certificate(key)));
        }

        let material = match &jwk.algorithm {
            AlgorithmParameters::RSA(RSAKeyParameters { n, e, .. }) => {
                KeyMaterial::Rsa(decoding_key_from_rsa_components(n, e)?)
            }
            AlgorithmParameters::EllipticCurve(EllipticCurveKeyParameters { x, y, .. }) => {
                let key = DecodingKey::from_ec_components(x, y)
                    .map_err(|e| format!("invalid EC key: {e}"))?;
                KeyMaterial::EllipticCurve(key)
            }
            AlgorithmParameters::OctetKey(_) => {
                return Err("symmetric keys are not trusted".to_string())
            }
            AlgorithmParameters::OctetKeyPair(_) => {
                return Err("OKP keys are not supported".to_string())
            }
        };

        Ok(Self::new(kid, material))
    }
}

fn decoding_key_from_rsa_components(n: &str, e: &str) -> Result<DecodingKey, String> {
    let n = URL_SAFE_NO_PAD
        .decode(n)
        .map_err(|e| format!("RSA modulus is not base64url: {e}"))?;
    let e = URL_SAFE_NO_PAD
        .decode(e)
        .map_err(|e| format!("RSA exponent is not base64url: {e}"))?;

    rsa_key(&n, &e)
}

fn decoding_key_from_certificate(encoded: &str) -> Result<DecodingKey, String> {
    // x5c entries use standard base64, not base64url
    let der = STANDARD
        .decode(encoded)
        .map_err(|e| format!("x5c certificate is not base64: {e}"))?;
    let (_, certificate) =
        X509Certificate::from_der(&der).map_err(|e| format!("invalid x5c certificate: {e}"))?;

    let public_key = certificate
        .public_key()
        .parsed()
        .map_err(|e| format!("invalid certificate public key: {e}"))?;

    match public_key {
        PublicKey::RSA(rsa) => rsa_key(rsa.modulus, rsa.exponent),
        PublicKey::EC(point) => Ok(DecodingKey::from_ec_der(point.data())),
        _ => Err("certificate key is neither RSA nor EC".to_string()),
    }
}

fn rsa_key(n: &[u8], e: &[u8]) -> Result<DecodingKey, String> {
    let n = strip_leading_zeros(n);
    let e = strip_leading_zeros(e);

    if n.is_empty() || e.is_empty() {
        return Err("RSA key has an empty modulus or exponent".to_string());
    }

    Ok(DecodingKey::from_rsa_raw_components(n, e))
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}
