use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::errors::JwtError;

/// Scope tag carried by password reset tokens.
pub const PASSWORD_RESET_SCOPE: &str = "password_reset";

/// Claims embedded in every token.
///
/// `sub` and `exp` are always present. A missing `scope` means general access.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (the account's email address)
    pub sub: String,

    /// Expiration time (Unix timestamp, seconds)
    pub exp: i64,

    /// Restricts the token to a single operation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl Claims {
    /// Create unscoped claims expiring at `exp` (Unix seconds).
    pub fn new(sub: impl ToString, exp: i64) -> Self {
        Self {
            sub: sub.to_string(),
            exp,
            scope: None,
        }
    }

    /// Create unscoped claims expiring `ttl` after `now`.
    ///
    /// # Errors
    /// * `ExpiryOutOfRange` - `now + ttl` is not a representable timestamp
    pub fn expiring_after(
        sub: impl ToString,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Self, JwtError> {
        let exp = now
            .checked_add_signed(ttl)
            .ok_or(JwtError::ExpiryOutOfRange)?;

        Ok(Self::new(sub, exp.timestamp()))
    }

    /// Set scope.
    pub fn with_scope(mut self, scope: impl ToString) -> Self {
        self.scope = Some(scope.to_string());
        self
    }

    /// Claims are void at and after `exp`.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp <= current_timestamp
    }

    /// True when the token grants general access (no scope, or an empty one).
    pub fn is_unscoped(&self) -> bool {
        self.scope.as_deref().map_or(true, str::is_empty)
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scope.as_deref() == Some(scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_claims() {
        let claims = Claims::new("alice@example.com", 1000);
        assert_eq!(claims.sub, "alice@example.com");
        assert_eq!(claims.exp, 1000);
        assert!(claims.scope.is_none());
        assert!(claims.is_unscoped());
    }

    #[test]
    fn test_expiring_after() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let claims =
            Claims::expiring_after("alice@example.com", now, Duration::minutes(30)).unwrap();

        assert_eq!(claims.exp - now.timestamp(), 30 * 60);
        assert!(claims.scope.is_none());
    }

    #[test]
    fn test_expiring_after_out_of_range() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();

        let far = Duration::try_days(1_000_000_000).unwrap();
        assert_eq!(
            Claims::expiring_after("alice@example.com", now, far),
            Err(JwtError::ExpiryOutOfRange)
        );
        assert_eq!(
            Claims::expiring_after("alice@example.com", now, -far),
            Err(JwtError::ExpiryOutOfRange)
        );
    }

    #[test]
    fn test_is_expired() {
        let claims = Claims::new("user", 1000);

        assert!(!claims.is_expired(999));
        assert!(claims.is_expired(1000)); // Exactly at expiration
        assert!(claims.is_expired(1001));
    }

    #[test]
    fn test_scope() {
        let claims = Claims::new("user", 1000).with_scope(PASSWORD_RESET_SCOPE);

        assert!(!claims.is_unscoped());
        assert!(claims.has_scope(PASSWORD_RESET_SCOPE));
        assert!(!claims.has_scope("admin"));

        // An empty scope is treated as general access
        let empty = Claims::new("user", 1000).with_scope("");
        assert!(empty.is_unscoped());
    }

    #[test]
    fn test_wire_format() {
        let unscoped = serde_json::to_value(Claims::new("user", 1000)).unwrap();
        assert_eq!(unscoped, serde_json::json!({"sub": "user", "exp": 1000}));

        let scoped =
            serde_json::to_value(Claims::new("user", 1000).with_scope(PASSWORD_RESET_SCOPE))
                .unwrap();
        assert_eq!(
            scoped,
            serde_json::json!({"sub": "user", "exp": 1000, "scope": "password_reset"})
        );
    }
}
