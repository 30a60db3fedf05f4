use std::sync::Arc;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use super::claims::Claims;
use super::claims::PASSWORD_RESET_SCOPE;
use super::codec::TokenCodec;
use super::errors::JwtError;
use crate::config::AuthSettings;
use crate::config::ConfigurationError;

/// Longest lifetime any token may be issued with.
pub const MAX_LIFETIME_DAYS: i64 = 3650;

/// Validated token lifetimes.
///
/// Invariants: every lifetime is positive and at most `MAX_LIFETIME_DAYS`,
/// `long > short`, and `reset < long`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLifetimes {
    short: Duration,
    long: Duration,
    reset: Duration,
}

impl TokenLifetimes {
    /// # Arguments
    /// * `short` - Lifetime of an ordinary access token
    /// * `long` - Lifetime of a "remember me" access token
    /// * `reset` - Lifetime of a password reset token
    ///
    /// # Errors
    /// * `NonPositiveLifetime` - A lifetime is zero or negative
    /// * `LifetimeOutOfRange` - A lifetime exceeds `MAX_LIFETIME_DAYS`
    /// * `RememberMeNotLonger` - `long` does not exceed `short`
    /// * `ResetLifetimeTooLong` - `reset` is not shorter than `long`
    pub fn new(short: Duration, long: Duration, reset: Duration) -> Result<Self, ConfigurationError> {
        let max = Duration::days(MAX_LIFETIME_DAYS);
        for (name, ttl) in [("short", short), ("long", long), ("reset", reset)] {
            if ttl <= Duration::zero() {
                return Err(ConfigurationError::NonPositiveLifetime(name));
            }
            if ttl > max {
                return Err(ConfigurationError::LifetimeOutOfRange(name));
            }
        }
        if long <= short {
            return Err(ConfigurationError::RememberMeNotLonger);
        }
        if reset >= long {
            return Err(ConfigurationError::ResetLifetimeTooLong);
        }

        Ok(Self { short, long, reset })
    }

    pub fn from_settings(settings: &AuthSettings) -> Result<Self, ConfigurationError> {
        Self::new(settings.short_ttl()?, settings.long_ttl()?, settings.reset_ttl()?)
    }

    pub fn short(&self) -> Duration {
        self.short
    }

    pub fn long(&self) -> Duration {
        self.long
    }

    pub fn reset(&self) -> Duration {
        self.reset
    }

    /// Access token lifetime for the given "remember me" choice.
    pub fn access(&self, remember: bool) -> Duration {
        if remember {
            self.long
        } else {
            self.short
        }
    }
}

/// Mints access and password reset tokens.
///
/// Callers are expected to have verified the user's credential already; the
/// subject is signed as given.
pub struct TokenIssuer {
    codec: Arc<TokenCodec>,
    lifetimes: TokenLifetimes,
}

impl TokenIssuer {
    pub fn new(codec: Arc<TokenCodec>, lifetimes: TokenLifetimes) -> Self {
        Self { codec, lifetimes }
    }

    pub fn lifetimes(&self) -> &TokenLifetimes {
        &self.lifetimes
    }

    /// Issue an unscoped access token.
    ///
    /// # Arguments
    /// * `subject` - Account identifier (email address)
    /// * `remember` - Selects the long lifetime instead of the short one
    /// * `now` - Issuance time
    pub fn issue_access_token(
        &self,
        subject: &str,
        remember: bool,
        now: DateTime<Utc>,
    ) -> Result<String, JwtError> {
        let claims = Claims::expiring_after(subject, now, self.lifetimes.access(remember))?;
        self.codec.encode(&claims)
    }

    /// Issue a token that only authorizes a password reset.
    ///
    /// # Arguments
    /// * `subject` - Account identifier (email address)
    /// * `now` - Issuance time
    pub fn issue_reset_token(&self, subject: &str, now: DateTime<Utc>) -> Result<String, JwtError> {
        let claims = Claims::expiring_after(subject, now, self.lifetimes.reset)?
            .with_scope(PASSWORD_RESET_SCOPE);
        self.codec.encode(&claims)
    }
}
