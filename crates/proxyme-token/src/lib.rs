//! # proxyme-token
//!
//! Compact signed-token codec for Proxyme delegation tokens.
//!
//! Tokens use the RFC-7519 compact serialization restricted to the HS256
//! algorithm: three `.`-joined base64url segments (no padding) carrying the
//! header JSON, the payload JSON, and a raw HMAC-SHA256 digest over the two
//! encoded segments. Header and payload are serialized as canonical JSON
//! (no extraneous whitespace, stable key order), so encoding is
//! deterministic for fixed inputs and key.

pub mod claims;
pub mod codec;
pub mod error;

pub use claims::Claims;
pub use codec::{decode, encode, Algorithm, DecodeOptions};
pub use error::TokenError;
