//! Token claims for delegation tokens.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An open, string-keyed claim set.
///
/// Reserved claims used by the delegation engine: `iss`, `sub`, `aud`,
/// `iat`, `exp`, `agent_id`, and `scope` (a space-joined scope string).
/// Any other JSON-compatible claim may be carried alongside them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    /// Create an empty claim set.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wrap an existing claim map.
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Set the `iss` claim.
    pub fn with_issuer(self, issuer: impl Into<String>) -> Self {
        self.with_claim("iss", Value::String(issuer.into()))
    }

    /// Set the `sub` claim.
    pub fn with_subject(self, subject: impl Into<String>) -> Self {
        self.with_claim("sub", Value::String(subject.into()))
    }

    /// Set the `aud` claim.
    pub fn with_audience(self, audience: impl Into<String>) -> Self {
        self.with_claim("aud", Value::String(audience.into()))
    }

    /// Set the `iat` claim (epoch seconds).
    pub fn with_issued_at(self, iat: i64) -> Self {
        self.with_claim("iat", Value::from(iat))
    }

    /// Set the `exp` claim (epoch seconds).
    pub fn with_expiry(self, exp: i64) -> Self {
        self.with_claim("exp", Value::from(exp))
    }

    /// Set the `agent_id` claim.
    pub fn with_agent_id(self, agent_id: impl Into<String>) -> Self {
        self.with_claim("agent_id", Value::String(agent_id.into()))
    }

    /// Set the `scope` claim from individual scopes, space-joined.
    pub fn with_scopes<I, S>(self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = scopes
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(" ");
        self.with_claim("scope", Value::String(joined))
    }

    /// Set an arbitrary claim.
    pub fn with_claim(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    /// Get a claim by name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether a claim is present.
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// The `iss` claim, if present and a string.
    pub fn issuer(&self) -> Option<&str> {
        self.string_claim("iss")
    }

    /// The `sub` claim, if present and a string.
    pub fn subject(&self) -> Option<&str> {
        self.string_claim("sub")
    }

    /// The `aud` claim, if present and a string.
    pub fn audience(&self) -> Option<&str> {
        self.string_claim("aud")
    }

    /// The `agent_id` claim, if present and a string.
    pub fn agent_id(&self) -> Option<&str> {
        self.string_claim("agent_id")
    }

    /// The `iat` claim as epoch seconds.
    pub fn issued_at(&self) -> Option<i64> {
        self.epoch_claim("iat")
    }

    /// The `exp` claim as epoch seconds.
    pub fn expiry(&self) -> Option<i64> {
        self.epoch_claim("exp")
    }

    /// The `scope` claim split into individual scopes.
    pub fn scopes(&self) -> Vec<String> {
        self.string_claim("scope")
            .map(|s| s.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Borrow the underlying claim map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume into the underlying claim map.
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    fn string_claim(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Read a numeric claim as whole epoch seconds. Claims are expected to
    /// be integers; a float value is accepted but compared on its integer
    /// part so sub-second noise cannot flip an expiry check.
    fn epoch_claim(&self, key: &str) -> Option<i64> {
        let value = self.0.get(key)?;
        value
            .as_i64()
            .or_else(|| value.as_f64().map(|f| f.trunc() as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_reserved_claims() {
        let claims = Claims::new()
            .with_issuer("http://127.0.0.1:5001")
            .with_subject("u1")
            .with_audience("agent-1")
            .with_issued_at(1_700_000_000)
            .with_expiry(1_700_003_600)
            .with_agent_id("agent-1")
            .with_scopes(["read", "write"]);

        assert_eq!(claims.issuer(), Some("http://127.0.0.1:5001"));
        assert_eq!(claims.subject(), Some("u1"));
        assert_eq!(claims.audience(), Some("agent-1"));
        assert_eq!(claims.issued_at(), Some(1_700_000_000));
        assert_eq!(claims.expiry(), Some(1_700_003_600));
        assert_eq!(claims.get("scope").unwrap(), "read write");
        assert_eq!(claims.scopes(), vec!["read", "write"]);
    }

    #[test]
    fn float_epoch_claim_truncates_toward_zero() {
        let claims = Claims::new().with_claim("exp", serde_json::json!(1700000000.9));
        assert_eq!(claims.expiry(), Some(1_700_000_000));
    }

    #[test]
    fn scopes_empty_when_claim_absent() {
        assert!(Claims::new().scopes().is_empty());
    }
}
