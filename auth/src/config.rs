use std::fmt;

use chrono::Duration;
use jsonwebtoken::Algorithm;
use serde::Deserialize;
use thiserror::Error;

/// Startup-time misconfiguration. Any of these should abort the process.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Token signing secret is empty")]
    MissingSecret,

    #[error("Unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Token lifetime must be positive: {0}")]
    NonPositiveLifetime(&'static str),

    #[error("Token lifetime is out of range: {0}")]
    LifetimeOutOfRange(&'static str),

    #[error("Remember-me lifetime must exceed the default access token lifetime")]
    RememberMeNotLonger,

    #[error("Reset token lifetime must be shorter than the remember-me lifetime")]
    ResetLifetimeTooLong,

    #[error("Invalid password hashing parameters: {0}")]
    InvalidHashing(String),
}

/// Authentication settings, loaded once at startup and never mutated.
#[derive(Clone, Deserialize)]
pub struct AuthSettings {
    /// Shared HMAC secret used to sign and verify every token.
    pub secret: String,

    /// JWT algorithm name (`HS256`, `HS384` or `HS512`).
    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    /// Lifetime of an ordinary access token.
    #[serde(default = "default_access_token_expire_minutes")]
    pub access_token_expire_minutes: i64,

    /// Lifetime of an access token issued with "remember me".
    #[serde(default = "default_remember_me_expire_days")]
    pub remember_me_expire_days: i64,

    /// Lifetime of a password reset token.
    #[serde(default = "default_reset_token_expire_minutes")]
    pub reset_token_expire_minutes: i64,

    #[serde(default)]
    pub hashing: HashingSettings,
}

/// Argon2 work factor.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct HashingSettings {
    pub memory_cost_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashingSettings {
    fn default() -> Self {
        Self {
            memory_cost_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

fn default_algorithm() -> String {
    "HS256".to_string()
}

fn default_access_token_expire_minutes() -> i64 {
    30
}

fn default_remember_me_expire_days() -> i64 {
    30
}

fn default_reset_token_expire_minutes() -> i64 {
    30
}

impl AuthSettings {
    /// Create settings with the default algorithm, lifetimes and work factor.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            algorithm: default_algorithm(),
            access_token_expire_minutes: default_access_token_expire_minutes(),
            remember_me_expire_days: default_remember_me_expire_days(),
            reset_token_expire_minutes: default_reset_token_expire_minutes(),
            hashing: HashingSettings::default(),
        }
    }

    /// Parse the configured algorithm name.
    ///
    /// Only the HMAC family is accepted since the key is a shared secret.
    ///
    /// # Errors
    /// * `UnsupportedAlgorithm` - Unknown name or an asymmetric algorithm
    pub fn signing_algorithm(&self) -> Result<Algorithm, ConfigurationError> {
        match self.algorithm.parse::<Algorithm>() {
            Ok(algorithm @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => {
                Ok(algorithm)
            }
            _ => Err(ConfigurationError::UnsupportedAlgorithm(
                self.algorithm.clone(),
            )),
        }
    }

    /// # Errors
    /// * `LifetimeOutOfRange` - The minute count does not fit a `Duration`
    pub fn short_ttl(&self) -> Result<Duration, ConfigurationError> {
        Duration::try_minutes(self.access_token_expire_minutes)
            .ok_or(ConfigurationError::LifetimeOutOfRange("short"))
    }

    /// # Errors
    /// * `LifetimeOutOfRange` - The day count does not fit a `Duration`
    pub fn long_ttl(&self) -> Result<Duration, ConfigurationError> {
        Duration::try_days(self.remember_me_expire_days)
            .ok_or(ConfigurationError::LifetimeOutOfRange("long"))
    }

    /// # Errors
    /// * `LifetimeOutOfRange` - The minute count does not fit a `Duration`
    pub fn reset_ttl(&self) -> Result<Duration, ConfigurationError> {
        Duration::try_minutes(self.reset_token_expire_minutes)
            .ok_or(ConfigurationError::LifetimeOutOfRange("reset"))
    }
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field(
                "access_token_expire_minutes",
                &self.access_token_expire_minutes,
            )
            .field("remember_me_expire_days", &self.remember_me_expire_days)
            .field(
                "reset_token_expire_minutes",
                &self.reset_token_expire_minutes,
            )
            .field("hashing", &self.hashing)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = AuthSettings::new("secret");

        assert_eq!(settings.signing_algorithm(), Ok(Algorithm::HS256));
        assert_eq!(settings.short_ttl(), Ok(Duration::minutes(30)));
        assert_eq!(settings.long_ttl(), Ok(Duration::days(30)));
        assert_eq!(settings.reset_ttl(), Ok(Duration::minutes(30)));
    }

    #[test]
    fn test_oversized_lifetimes_rejected() {
        let mut settings = AuthSettings::new("secret");
        settings.remember_me_expire_days = i64::MAX / 2;
        settings.access_token_expire_minutes = i64::MAX;
        settings.reset_token_expire_minutes = i64::MIN;

        assert_eq!(
            settings.long_ttl(),
            Err(ConfigurationError::LifetimeOutOfRange("long"))
        );
        assert_eq!(
            settings.short_ttl(),
            Err(ConfigurationError::LifetimeOutOfRange("short"))
        );
        assert_eq!(
            settings.reset_ttl(),
            Err(ConfigurationError::LifetimeOutOfRange("reset"))
        );
    }

    #[test]
    fn test_hmac_algorithms_accepted() {
        for name in ["HS256", "HS384", "HS512"] {
            let mut settings = AuthSettings::new("secret");
            settings.algorithm = name.to_string();
            assert!(settings.signing_algorithm().is_ok(), "{name} rejected");
        }
    }

    #[test]
    fn test_asymmetric_and_unknown_algorithms_rejected() {
        for name in ["RS256", "EdDSA", "none", "hs256", ""] {
            let mut settings = AuthSettings::new("secret");
            settings.algorithm = name.to_string();
            assert_eq!(
                settings.signing_algorithm(),
                Err(ConfigurationError::UnsupportedAlgorithm(name.to_string()))
            );
        }
    }

    #[test]
    fn test_debug_redacts_secret() {
        let settings = AuthSettings::new("super-secret-signing-key");
        let rendered = format!("{:?}", settings);

        assert!(!rendered.contains("super-secret-signing-key"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_deserialize_applies_defaults() {
        let settings: AuthSettings =
            serde_json::from_str(r#"{"secret": "abc", "access_token_expire_minutes": 15}"#)
                .expect("Failed to deserialize settings");

        assert_eq!(settings.secret, "abc");
        assert_eq!(settings.algorithm, "HS256");
        assert_eq!(settings.short_ttl(), Ok(Duration::minutes(15)));
        assert_eq!(settings.hashing, HashingSettings::default());
    }
}
