use std::sync::Arc;

use chrono::DateTime;
use chrono::Utc;
use thiserror::Error;

use crate::config::AuthSettings;
use crate::config::ConfigurationError;
use crate::jwt::JwtError;
use crate::jwt::TokenCodec;
use crate::jwt::TokenIssuer;
use crate::jwt::TokenLifetimes;
use crate::jwt::PASSWORD_RESET_SCOPE;
use crate::password::PasswordError;
use crate::password::PasswordHasher;
use crate::resolver::IdentityResolver;
use crate::resolver::PrincipalLookup;

/// Authentication coordinator combining password verification and token handling.
///
/// Holds the immutable signing key, lifetimes and work factor. Share it through
/// an `Arc`; every method takes `&self`.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    codec: Arc<TokenCodec>,
    issuer: TokenIssuer,
}

/// Result of successful authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationResult {
    /// Signed access token
    pub access_token: String,
}

/// Authentication operation errors.
#[derive(Debug, Clone, Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("JWT error: {0}")]
    JwtError(#[from] JwtError),
}

/// Password reset token redemption errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResetTokenError {
    #[error("Reset token has expired")]
    Expired,

    #[error("Reset token is invalid")]
    Invalid,
}

impl Authenticator {
    /// Create a new authenticator from already-built parts.
    pub fn new(
        password_hasher: PasswordHasher,
        codec: Arc<TokenCodec>,
        lifetimes: TokenLifetimes,
    ) -> Self {
        Self {
            password_hasher,
            issuer: TokenIssuer::new(Arc::clone(&codec), lifetimes),
            codec,
        }
    }

    /// Build an authenticator from startup settings.
    ///
    /// # Errors
    /// * `MissingSecret` - Signing secret is empty
    /// * `UnsupportedAlgorithm` - Algorithm is not HS256/HS384/HS512
    /// * `NonPositiveLifetime`, `LifetimeOutOfRange`, `RememberMeNotLonger`,
    ///   `ResetLifetimeTooLong` - Bad lifetimes
    /// * `InvalidHashing` - Argon2 rejected the work factor
    pub fn from_settings(settings: &AuthSettings) -> Result<Self, ConfigurationError> {
        if settings.secret.trim().is_empty() {
            return Err(ConfigurationError::MissingSecret);
        }

        let codec = TokenCodec::from_settings(settings)?;
        let lifetimes = TokenLifetimes::from_settings(settings)?;
        let password_hasher = PasswordHasher::with_settings(&settings.hashing)
            .map_err(|e| ConfigurationError::InvalidHashing(e.to_string()))?;

        Ok(Self::new(password_hasher, Arc::new(codec), lifetimes))
    }

    pub fn lifetimes(&self) -> &TokenLifetimes {
        self.issuer.lifetimes()
    }

    /// Hash a password for storage.
    ///
    /// CPU and memory heavy; async callers should run it on a blocking pool.
    ///
    /// # Errors
    /// * `PasswordError` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Check a password against a stored hash. Malformed hashes never match.
    pub fn verify_password(&self, password: &str, stored_hash: &str) -> bool {
        self.password_hasher.verify(password, stored_hash)
    }

    /// Verify credentials and issue an access token.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `stored_hash` - Stored password hash
    /// * `subject` - Account identifier to sign into the token
    /// * `remember` - Issue a long-lived token
    /// * `now` - Issuance time
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match
    /// * `JwtError` - Token generation failed
    pub fn authenticate(
        &self,
        password: &str,
        stored_hash: &str,
        subject: &str,
        remember: bool,
        now: DateTime<Utc>,
    ) -> Result<AuthenticationResult, AuthenticationError> {
        if !self.password_hasher.verify(password, stored_hash) {
            return Err(AuthenticationError::InvalidCredentials);
        }

        let access_token = self.issuer.issue_access_token(subject, remember, now)?;

        Ok(AuthenticationResult { access_token })
    }

    /// Issue an access token without password verification.
    ///
    /// Only for callers that have already authenticated the subject.
    pub fn issue_access_token(
        &self,
        subject: &str,
        remember: bool,
        now: DateTime<Utc>,
    ) -> Result<String, JwtError> {
        self.issuer.issue_access_token(subject, remember, now)
    }

    /// Issue a password reset token for a subject.
    pub fn issue_reset_token(&self, subject: &str, now: DateTime<Utc>) -> Result<String, JwtError> {
        self.issuer.issue_reset_token(subject, now)
    }

    /// Validate a reset token and return the subject it authorizes.
    ///
    /// Mirror image of the identity resolver's scope rule: only tokens scoped
    /// to password reset are accepted, so an access token is refused here.
    ///
    /// # Errors
    /// * `Expired` - Token was genuine but its window has passed
    /// * `Invalid` - Any other failure, including a missing or foreign scope
    pub fn redeem_reset_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<String, ResetTokenError> {
        let claims = self.codec.decode_at(token, now).map_err(|e| {
            tracing::warn!(reason = e.kind(), "Reset token rejected");
            match e {
                JwtError::Expired => ResetTokenError::Expired,
                _ => ResetTokenError::Invalid,
            }
        })?;

        if !claims.has_scope(PASSWORD_RESET_SCOPE) {
            tracing::warn!("Token without reset scope presented for password reset");
            return Err(ResetTokenError::Invalid);
        }
        if claims.sub.is_empty() {
            return Err(ResetTokenError::Invalid);
        }

        Ok(claims.sub)
    }

    /// Build an identity resolver sharing this authenticator's key.
    pub fn resolver<L: PrincipalLookup + ?Sized>(&self, lookup: Arc<L>) -> IdentityResolver<L> {
        IdentityResolver::new(Arc::clone(&self.codec), lookup)
    }
}
