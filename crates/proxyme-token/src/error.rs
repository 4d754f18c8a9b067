//! Error types for the token codec.

use thiserror::Error;

/// Errors that can occur while encoding or decoding tokens.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Token structure or segment content could not be parsed.
    #[error("malformed token: {0}")]
    Malformed(String),

    /// Encoding was requested with an algorithm this codec does not implement.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The token header names an algorithm outside the allowed set.
    #[error("algorithm not allowed: {0}")]
    AlgorithmNotAllowed(String),

    /// Signature did not match the recomputed digest.
    #[error("signature verification failed")]
    SignatureInvalid,

    /// The `exp` claim is in the past.
    #[error("token expired at {expired_at}")]
    Expired { expired_at: i64 },

    /// The `aud` claim does not match the expected audience.
    #[error("invalid audience, expected '{expected}'")]
    AudienceMismatch { expected: String },

    /// A required claim is absent from the payload.
    #[error("missing required claim: {claim}")]
    MissingClaim { claim: String },

    /// Signature verification was requested without a usable key.
    #[error("signature verification requires a non-empty key")]
    InvalidKey,
}
