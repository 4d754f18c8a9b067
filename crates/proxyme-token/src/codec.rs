//! Token encoding and verifying decode.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde_json::{Map, Value};
use sha2::Sha256;

use crate::claims::Claims;
use crate::error::TokenError;

type HmacSha256 = Hmac<Sha256>;

/// Signature algorithms understood by the codec.
///
/// Only HS256 is implemented; requesting anything else fails at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// HMAC-SHA256 with a shared symmetric key.
    Hs256,
}

impl Algorithm {
    /// The algorithm name as carried in the token header.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hs256 => "HS256",
        }
    }

    /// Parse an algorithm name.
    pub fn from_name(name: &str) -> Result<Self, TokenError> {
        match name {
            "HS256" => Ok(Self::Hs256),
            other => Err(TokenError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// Options controlling which verifications `decode` performs.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Verify the signature segment. Requires a non-empty key.
    pub verify_signature: bool,

    /// Verify the `exp` claim against the current time, when present.
    pub verify_exp: bool,

    /// Verify the `aud` claim against `audience`.
    pub verify_aud: bool,

    /// Expected audience for `verify_aud`.
    pub audience: Option<String>,

    /// Header algorithms accepted during decode.
    pub algorithms: Vec<Algorithm>,

    /// Claims that must be present in the payload.
    pub required: Vec<String>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            verify_signature: true,
            verify_exp: true,
            verify_aud: false,
            audience: None,
            algorithms: vec![Algorithm::Hs256],
            required: Vec::new(),
        }
    }
}

impl DecodeOptions {
    /// Options that skip every verification, for reading claims out of a
    /// token before the authoritative verifying decode.
    pub fn unverified() -> Self {
        Self {
            verify_signature: false,
            verify_exp: false,
            verify_aud: false,
            ..Default::default()
        }
    }

    /// Set the expected audience and enable audience verification.
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.verify_aud = true;
        self.audience = Some(audience.into());
        self
    }

    /// Set the claims that must be present.
    pub fn with_required<I, S>(mut self, claims: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required = claims.into_iter().map(Into::into).collect();
        self
    }
}

/// Encode a claim set into a signed compact token.
///
/// Deterministic for fixed claims, key, and algorithm: segments are
/// canonical JSON (sorted keys, no whitespace) in unpadded base64url, and
/// the signature is HMAC-SHA256 over `encoded_header.encoded_payload`.
pub fn encode(claims: &Claims, key: &[u8], algorithm: Algorithm) -> Result<String, TokenError> {
    if key.is_empty() {
        return Err(TokenError::InvalidKey);
    }

    let mut header = Map::new();
    header.insert("alg".to_string(), Value::String(algorithm.as_str().to_string()));
    header.insert("typ".to_string(), Value::String("JWT".to_string()));

    let header_json = serde_json::to_vec(&header)
        .map_err(|e| TokenError::Malformed(e.to_string()))?;
    let payload_json = serde_json::to_vec(claims.as_map())
        .map_err(|e| TokenError::Malformed(e.to_string()))?;

    let encoded_header = URL_SAFE_NO_PAD.encode(header_json);
    let encoded_payload = URL_SAFE_NO_PAD.encode(payload_json);
    let signing_input = format!("{encoded_header}.{encoded_payload}");

    let signature = match algorithm {
        Algorithm::Hs256 => {
            let mut mac = HmacSha256::new_from_slice(key)
                .map_err(|_| TokenError::InvalidKey)?;
            mac.update(signing_input.as_bytes());
            mac.finalize().into_bytes()
        }
    };

    let encoded_signature = URL_SAFE_NO_PAD.encode(signature);
    Ok(format!("{signing_input}.{encoded_signature}"))
}

/// Decode a compact token, applying the verifications selected in `options`.
///
/// The key is optional only so callers can perform an unverified pre-read;
/// requesting signature verification without a non-empty key fails fast
/// with [`TokenError::InvalidKey`] rather than silently skipping the check.
pub fn decode(
    token: &str,
    key: Option<&[u8]>,
    options: &DecodeOptions,
) -> Result<Claims, TokenError> {
    decode_at(token, key, options, chrono::Utc::now().timestamp())
}

/// Decode with an explicit notion of "now" for the expiry check.
pub fn decode_at(
    token: &str,
    key: Option<&[u8]>,
    options: &DecodeOptions,
    now: i64,
) -> Result<Claims, TokenError> {
    let parts: Vec<&str> = token.split('.').collect();
    let [encoded_header, encoded_payload, encoded_signature] = parts.as_slice() else {
        return Err(TokenError::Malformed(
            "expected three dot-separated segments".to_string(),
        ));
    };

    let header: Map<String, Value> = decode_json_segment(encoded_header)?;
    let payload: Map<String, Value> = decode_json_segment(encoded_payload)?;
    let signature = URL_SAFE_NO_PAD
        .decode(encoded_signature)
        .map_err(|e| TokenError::Malformed(format!("invalid signature segment: {e}")))?;

    let alg_name = header
        .get("alg")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let allowed = Algorithm::from_name(alg_name)
        .ok()
        .filter(|alg| options.algorithms.contains(alg));
    let Some(algorithm) = allowed else {
        return Err(TokenError::AlgorithmNotAllowed(alg_name.to_string()));
    };

    if options.verify_signature {
        let key = match key {
            Some(key) if !key.is_empty() => key,
            _ => return Err(TokenError::InvalidKey),
        };
        match algorithm {
            Algorithm::Hs256 => {
                let mut mac = HmacSha256::new_from_slice(key)
                    .map_err(|_| TokenError::InvalidKey)?;
                mac.update(encoded_header.as_bytes());
                mac.update(b".");
                mac.update(encoded_payload.as_bytes());
                // verify_slice is a constant-time comparison
                mac.verify_slice(&signature)
                    .map_err(|_| TokenError::SignatureInvalid)?;
            }
        }
    }

    let claims = Claims::from_map(payload);

    if options.verify_exp {
        if let Some(exp) = claims.expiry() {
            if exp < now {
                return Err(TokenError::Expired { expired_at: exp });
            }
        }
    }

    if options.verify_aud {
        if let Some(expected) = &options.audience {
            if claims.audience() != Some(expected.as_str()) {
                return Err(TokenError::AudienceMismatch {
                    expected: expected.clone(),
                });
            }
        }
    }

    for claim in &options.required {
        if !claims.contains(claim) {
            return Err(TokenError::MissingClaim {
                claim: claim.clone(),
            });
        }
    }

    Ok(claims)
}

fn decode_json_segment(segment: &str) -> Result<Map<String, Value>, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| TokenError::Malformed(format!("invalid base64 segment: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| TokenError::Malformed(format!("invalid JSON segment: {e}")))
}
