//! Error types for the delegation engine.

use proxyme_token::TokenError;
use thiserror::Error;

/// Errors that can occur during delegation operations.
///
/// All variants are local, recoverable conditions reported to the caller;
/// none is process-fatal.
#[derive(Debug, Error)]
pub enum DelegationError {
    /// No token string was provided.
    #[error("no token provided")]
    NoToken,

    /// The agent is not registered.
    #[error("invalid agent ID: {0}")]
    UnknownAgent(String),

    /// Requested scopes exceed the agent's granted scopes.
    #[error("invalid scope request: {requested:?} not granted")]
    ScopeNotGranted {
        requested: Vec<String>,
        granted: Vec<String>,
    },

    /// Token structure or content could not be parsed.
    #[error("invalid token: {0}")]
    MalformedToken(String),

    /// The token header names an algorithm outside the allowed set.
    #[error("algorithm not allowed: {0}")]
    AlgorithmNotAllowed(String),

    /// Signature verification failed.
    #[error("signature verification failed")]
    SignatureInvalid,

    /// The token's `exp` claim is in the past.
    #[error("token has expired")]
    TokenExpired,

    /// The token's `aud` claim does not match the expected audience.
    #[error("invalid audience")]
    AudienceMismatch,

    /// No delegation record exists for this token. Covers tokens signed
    /// correctly but never issued through this engine, and tokens issued
    /// before a restart that lost the in-memory store.
    #[error("no delegation found for token")]
    UnknownDelegation,

    /// The stored delegation record has expired, independent of the claim.
    #[error("delegation has expired")]
    DelegationExpired,

    /// The token appears in the revocation ledger.
    #[error("token revoked")]
    TokenRevoked,

    /// Revocation ledger failure.
    #[error("revocation ledger error: {0}")]
    Ledger(#[from] sqlx::Error),

    /// Audit sink failure.
    #[error("audit error: {0}")]
    Audit(#[from] proxyme_audit::AuditError),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<TokenError> for DelegationError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Malformed(msg) => Self::MalformedToken(msg),
            TokenError::UnsupportedAlgorithm(alg) | TokenError::AlgorithmNotAllowed(alg) => {
                Self::AlgorithmNotAllowed(alg)
            }
            TokenError::SignatureInvalid => Self::SignatureInvalid,
            TokenError::Expired { .. } => Self::TokenExpired,
            TokenError::AudienceMismatch { .. } => Self::AudienceMismatch,
            // A missing required claim surfaces as a generic invalid token,
            // matching the reference behavior
            TokenError::MissingClaim { claim } => {
                Self::MalformedToken(format!("missing required claim: {claim}"))
            }
            TokenError::InvalidKey => {
                Self::Internal(anyhow::anyhow!("signing key unavailable for verification"))
            }
        }
    }
}
