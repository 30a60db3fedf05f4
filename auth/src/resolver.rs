use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use thiserror::Error;

use crate::jwt::JwtError;
use crate::jwt::TokenCodec;

/// Fetches the principal a token's subject refers to.
///
/// Implemented by whatever owns user records; called on every resolution,
/// never cached.
#[async_trait]
pub trait PrincipalLookup: Send + Sync {
    type Principal: Send;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Retrieve the principal for a subject.
    ///
    /// # Returns
    /// `None` when no account has this subject
    async fn find_by_subject(&self, subject: &str)
        -> Result<Option<Self::Principal>, Self::Error>;
}

/// Identity resolution failures.
///
/// Decode failures, unknown subjects and deleted accounts all surface as
/// `InvalidCredential`; the underlying reason only goes to the logs.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("No credential supplied")]
    MissingCredential,

    #[error("Could not validate credentials")]
    InvalidCredential,

    #[error("Token scope does not grant general access")]
    ScopeRejected,

    #[error("Principal lookup failed: {0}")]
    LookupFailed(String),
}

/// Turns a bearer token into the principal it identifies.
pub struct IdentityResolver<L: PrincipalLookup + ?Sized> {
    codec: Arc<TokenCodec>,
    lookup: Arc<L>,
}

impl<L: PrincipalLookup + ?Sized> Clone for IdentityResolver<L> {
    fn clone(&self) -> Self {
        Self {
            codec: Arc::clone(&self.codec),
            lookup: Arc::clone(&self.lookup),
        }
    }
}

impl<L: PrincipalLookup + ?Sized> IdentityResolver<L> {
    pub fn new(codec: Arc<TokenCodec>, lookup: Arc<L>) -> Self {
        Self { codec, lookup }
    }

    /// Resolve a bearer token against the current time.
    pub async fn resolve(&self, token: Option<&str>) -> Result<L::Principal, IdentityError> {
        self.resolve_at(token, Utc::now()).await
    }

    /// Resolve a bearer token against `now`.
    ///
    /// # Errors
    /// * `MissingCredential` - No token, or an empty one
    /// * `InvalidCredential` - Token does not decode, or its subject has no account
    /// * `ScopeRejected` - Token carries a scope (e.g. a password reset token)
    /// * `LookupFailed` - The principal lookup itself failed
    pub async fn resolve_at(
        &self,
        token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<L::Principal, IdentityError> {
        let token = match token.map(str::trim) {
            Some(token) if !token.is_empty() => token,
            _ => return Err(IdentityError::MissingCredential),
        };

        let claims = self
            .codec
            .decode_at(token, now)
            .map_err(|e: JwtError| {
                tracing::warn!(reason = e.kind(), "Bearer token rejected");
                IdentityError::InvalidCredential
            })?;

        if !claims.is_unscoped() {
            tracing::warn!(
                scope = claims.scope.as_deref().unwrap_or_default(),
                "Scoped token presented for general access"
            );
            return Err(IdentityError::ScopeRejected);
        }

        match self.lookup.find_by_subject(&claims.sub).await {
            Ok(Some(principal)) => Ok(principal),
            Ok(None) => {
                tracing::warn!("Token subject has no account");
                Err(IdentityError::InvalidCredential)
            }
            Err(e) => {
                tracing::error!(error = %e, "Principal lookup failed");
                Err(IdentityError::LookupFailed(e.to_string()))
            }
        }
    }
}
