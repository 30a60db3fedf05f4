use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::NaiveDate;
use chrono::Utc;
use uuid::Uuid;

use crate::user::errors::AddressError;
use crate::user::errors::EmailError;
use crate::user::errors::FullNameError;
use crate::user::errors::PasswordPolicyError;
use crate::user::errors::UserIdError;

/// User aggregate entity.
///
/// Represents a registered account holder. The email address doubles as the
/// token subject.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub email: EmailAddress,
    pub full_name: Option<FullName>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<Address>,
    /// Opt-in for daily reminder emails
    pub send_reminders: bool,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// A freshly registered account: new id, empty profile, reminders on.
    pub fn new(email: EmailAddress, full_name: Option<FullName>, password_hash: String) -> Self {
        Self {
            id: UserId::new(),
            email,
            full_name,
            date_of_birth: None,
            address: None,
            send_reminders: true,
            password_hash,
            created_at: Utc::now(),
        }
    }

    /// Apply a partial profile update. Fields absent from the command are kept.
    pub fn apply(&mut self, update: UpdateProfileCommand) {
        if let Some(full_name) = update.full_name {
            self.full_name = full_name;
        }
        if let Some(date_of_birth) = update.date_of_birth {
            self.date_of_birth = date_of_birth;
        }
        if let Some(address) = update.address {
            self.address = address;
        }
        if let Some(send_reminders) = update.send_reminders {
            self.send_reminders = send_reminders;
        }
    }
}

/// User unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random user ID.
    ///
    /// # Returns
    /// UserId with random UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, UserIdError> {
        Uuid::parse_str(s)
            .map(UserId)
            .map_err(|e| UserIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validates email format using RFC 5322 compliant parser.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// Surrounding whitespace is dropped before validation.
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        let email = email.trim().to_string();
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Display name, at most 100 characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullName(String);

impl FullName {
    const MAX_LENGTH: usize = 100;

    /// # Errors
    /// * `TooLong` - More than 100 characters
    pub fn new(full_name: String) -> Result<Self, FullNameError> {
        let length = full_name.chars().count();
        if length > Self::MAX_LENGTH {
            return Err(FullNameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            });
        }
        Ok(Self(full_name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Postal address, at most 255 characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address(String);

impl Address {
    const MAX_LENGTH: usize = 255;

    /// # Errors
    /// * `TooLong` - More than 255 characters
    pub fn new(address: String) -> Result<Self, AddressError> {
        let length = address.chars().count();
        if length > Self::MAX_LENGTH {
            return Err(AddressError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            });
        }
        Ok(Self(address))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A plaintext password chosen by the user, checked against the length policy.
///
/// Never printed: `Debug` is redacted and there is no `Display`.
#[derive(Clone)]
pub struct NewPassword(String);

impl NewPassword {
    const MIN_LENGTH: usize = 8;
    const MAX_LENGTH: usize = 128;

    /// # Errors
    /// * `TooShort` - Fewer than 8 characters
    /// * `TooLong` - More than 128 characters
    pub fn new(password: String) -> Result<Self, PasswordPolicyError> {
        let length = password.chars().count();
        if length < Self::MIN_LENGTH {
            Err(PasswordPolicyError::TooShort {
                min: Self::MIN_LENGTH,
                actual: length,
            })
        } else if length > Self::MAX_LENGTH {
            Err(PasswordPolicyError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(Self(password))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for NewPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NewPassword(<redacted>)")
    }
}

/// Command to register a new account with domain types
#[derive(Debug)]
pub struct RegisterUserCommand {
    pub email: EmailAddress,
    pub full_name: Option<FullName>,
    pub password: NewPassword,
}

impl RegisterUserCommand {
    pub fn new(email: EmailAddress, full_name: Option<FullName>, password: NewPassword) -> Self {
        Self {
            email,
            full_name,
            password,
        }
    }
}

/// Partial profile update.
///
/// The outer `Option` says whether a field was sent at all; for nullable
/// fields the inner one is the new value, `None` clearing it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateProfileCommand {
    pub full_name: Option<Option<FullName>>,
    pub date_of_birth: Option<Option<NaiveDate>>,
    pub address: Option<Option<Address>>,
    pub send_reminders: Option<bool>,
}

/// Command to log in. The password is checked as given, without the length policy.
pub struct LoginCommand {
    pub email: EmailAddress,
    pub password: String,
    pub remember_me: bool,
}

impl fmt::Debug for LoginCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCommand")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("remember_me", &self.remember_me)
            .finish()
    }
}

/// Command to change the password of a logged-in account.
pub struct ChangePasswordCommand {
    pub current_password: String,
    pub new_password: NewPassword,
}

impl fmt::Debug for ChangePasswordCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangePasswordCommand")
            .field("current_password", &"<redacted>")
            .field("new_password", &self.new_password)
            .finish()
    }
}

/// Command to set a new password with an emailed reset token.
pub struct ResetPasswordCommand {
    pub token: String,
    pub new_password: NewPassword,
}

impl fmt::Debug for ResetPasswordCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResetPasswordCommand")
            .field("token", &"<redacted>")
            .field("new_password", &self.new_password)
            .finish()
    }
}
