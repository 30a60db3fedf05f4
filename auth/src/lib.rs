//! Authentication core for the health companion backend
//!
//! Provides the stateless credential and token machinery every account
//! operation depends on:
//! - Password hashing (Argon2id)
//! - Signed token encoding and validation with distinguishable failures
//! - Access tokens with a "remember me" lifetime and scoped password reset tokens
//! - Identity resolution of bearer tokens through an injected user lookup
//!
//! Nothing here talks HTTP or SQL. Services own their user store and adapt it
//! through [`PrincipalLookup`].
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash));
//! ```
//!
//! ## Complete Authentication Flow
//! ```
//! use auth::{AuthSettings, Authenticator, TokenCodec};
//! use chrono::Utc;
//!
//! let settings = AuthSettings::new("secret_key_at_least_32_bytes_long!");
//! let auth = Authenticator::from_settings(&settings).unwrap();
//!
//! // Register: hash password
//! let hash = auth.hash_password("password123").unwrap();
//!
//! // Login: verify and issue a short-lived token
//! let result = auth
//!     .authenticate("password123", &hash, "alice@example.com", false, Utc::now())
//!     .unwrap();
//!
//! // Decode the token with the same key
//! let claims = TokenCodec::from_settings(&settings)
//!     .unwrap()
//!     .decode(&result.access_token)
//!     .unwrap();
//! assert_eq!(claims.sub, "alice@example.com");
//! ```

pub mod authenticator;
pub mod config;
pub mod jwt;
pub mod password;
pub mod resolver;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::AuthenticationResult;
pub use authenticator::Authenticator;
pub use authenticator::ResetTokenError;
pub use config::AuthSettings;
pub use config::ConfigurationError;
pub use config::HashingSettings;
pub use jwt::Claims;
pub use jwt::JwtError;
pub use jwt::TokenCodec;
pub use jwt::TokenIssuer;
pub use jwt::TokenLifetimes;
pub use jwt::PASSWORD_RESET_SCOPE;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use resolver::IdentityError;
pub use resolver::IdentityResolver;
pub use resolver::PrincipalLookup;
