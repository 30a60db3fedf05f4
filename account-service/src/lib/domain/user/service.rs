use std::sync::Arc;

use async_trait::async_trait;
use auth::AuthenticationError;
use auth::AuthenticationResult;
use auth::Authenticator;
use auth::PrincipalLookup;
use chrono::Utc;

use crate::domain::user::models::ChangePasswordCommand;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::LoginCommand;
use crate::domain::user::models::RegisterUserCommand;
use crate::domain::user::models::ResetPasswordCommand;
use crate::domain::user::models::UpdateProfileCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::user::errors::UserError;
use crate::user::ports::PasswordResetMailer;
use crate::user::ports::UserRepository;
use crate::user::ports::UserServicePort;

/// Domain service implementation for account operations.
///
/// Concrete implementation of UserServicePort with dependency injection.
pub struct UserService<UR, M>
where
    UR: UserRepository,
    M: PasswordResetMailer,
{
    repository: Arc<UR>,
    mailer: Arc<M>,
    authenticator: Arc<Authenticator>,
}

impl<UR, M> UserService<UR, M>
where
    UR: UserRepository,
    M: PasswordResetMailer,
{
    /// Create a new user service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - User persistence implementation
    /// * `mailer` - Password reset delivery implementation
    /// * `authenticator` - Shared hashing and token machinery
    ///
    /// # Returns
    /// Configured user service instance
    pub fn new(repository: Arc<UR>, mailer: Arc<M>, authenticator: Arc<Authenticator>) -> Self {
        Self {
            repository,
            mailer,
            authenticator,
        }
    }

    /// Run Argon2 work off the async executor.
    async fn run_blocking<T, F>(&self, task: F) -> Result<T, UserError>
    where
        F: FnOnce(&Authenticator) -> T + Send + 'static,
        T: Send + 'static,
    {
        let authenticator = Arc::clone(&self.authenticator);
        tokio::task::spawn_blocking(move || task(&authenticator))
            .await
            .map_err(|e| UserError::Unknown(format!("Blocking task failed: {}", e)))
    }

    async fn hash_password(&self, password: &str) -> Result<String, UserError> {
        let password = password.to_string();
        let hash = self
            .run_blocking(move |authenticator| authenticator.hash_password(&password))
            .await??;
        Ok(hash)
    }

    async fn find_existing(&self, id: &UserId) -> Result<User, UserError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id.to_string()))
    }
}

#[async_trait]
impl<UR, M> UserServicePort for UserService<UR, M>
where
    UR: UserRepository,
    M: PasswordResetMailer,
{
    async fn register(&self, command: RegisterUserCommand) -> Result<User, UserError> {
        let password_hash = self.hash_password(command.password.expose()).await?;

        let user = User::new(command.email, command.full_name, password_hash);

        let created_user = self.repository.create(user).await?;
        tracing::info!(user_id = %created_user.id, "Account registered");

        Ok(created_user)
    }

    async fn login(&self, command: LoginCommand) -> Result<AuthenticationResult, UserError> {
        let Some(user) = self.repository.find_by_email(&command.email).await? else {
            tracing::info!("Login attempt for unknown account");
            return Err(UserError::InvalidCredentials);
        };

        let LoginCommand {
            password,
            remember_me,
            ..
        } = command;
        let stored_hash = user.password_hash.clone();
        let subject = user.email.as_str().to_string();

        let outcome = self
            .run_blocking(move |authenticator| {
                authenticator.authenticate(&password, &stored_hash, &subject, remember_me, Utc::now())
            })
            .await?;

        match outcome {
            Ok(result) => {
                tracing::info!(user_id = %user.id, remember_me, "Login succeeded");
                Ok(result)
            }
            Err(AuthenticationError::InvalidCredentials) => {
                tracing::info!(user_id = %user.id, "Login failed: wrong password");
                Err(UserError::InvalidCredentials)
            }
            Err(AuthenticationError::JwtError(e)) => Err(UserError::Token(e)),
        }
    }

    async fn get_user(&self, id: &UserId) -> Result<User, UserError> {
        self.find_existing(id).await
    }

    async fn update_profile(
        &self,
        id: &UserId,
        command: UpdateProfileCommand,
    ) -> Result<User, UserError> {
        let mut user = self.find_existing(id).await?;
        user.apply(command);

        let user = self.repository.update(user).await?;
        tracing::info!(user_id = %id, "Profile updated");

        Ok(user)
    }

    async fn change_password(
        &self,
        id: &UserId,
        command: ChangePasswordCommand,
    ) -> Result<(), UserError> {
        let mut user = self.find_existing(id).await?;

        let current_password = command.current_password;
        let stored_hash = user.password_hash.clone();
        let matches = self
            .run_blocking(move |authenticator| {
                authenticator.verify_password(&current_password, &stored_hash)
            })
            .await?;
        if !matches {
            return Err(UserError::IncorrectCurrentPassword);
        }

        user.password_hash = self.hash_password(command.new_password.expose()).await?;
        self.repository.update(user).await?;
        tracing::info!(user_id = %id, "Password changed");

        Ok(())
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), UserError> {
        self.repository.delete(id).await?;
        tracing::info!(user_id = %id, "Account deleted");
        Ok(())
    }

    async fn forgot_password(&self, email: &EmailAddress) -> Result<(), UserError> {
        let Some(user) = self.repository.find_by_email(email).await? else {
            tracing::info!("Password reset requested for unknown account");
            return Ok(());
        };

        let token = self
            .authenticator
            .issue_reset_token(user.email.as_str(), Utc::now())?;

        if let Err(e) = self.mailer.send_password_reset(&user.email, &token).await {
            tracing::error!(
                "Failed to send password reset email for user {}: {}",
                user.id,
                e
            );
        }

        Ok(())
    }

    async fn reset_password(&self, command: ResetPasswordCommand) -> Result<(), UserError> {
        let subject = self
            .authenticator
            .redeem_reset_token(&command.token, Utc::now())?;

        let email = EmailAddress::new(subject).map_err(|_| UserError::ResetTokenInvalid)?;
        let Some(mut user) = self.repository.find_by_email(&email).await? else {
            tracing::warn!("Reset token subject has no account");
            return Err(UserError::ResetTokenInvalid);
        };

        user.password_hash = self.hash_password(command.new_password.expose()).await?;
        let user = self.repository.update(user).await?;
        tracing::info!(user_id = %user.id, "Password reset");

        Ok(())
    }
}

#[async_trait]
impl<UR, M> PrincipalLookup for UserService<UR, M>
where
    UR: UserRepository,
    M: PasswordResetMailer,
{
    type Principal = User;
    type Error = UserError;

    async fn find_by_subject(&self, subject: &str) -> Result<Option<User>, UserError> {
        match EmailAddress::new(subject.to_string()) {
            Ok(email) => self.repository.find_by_email(&email).await,
            Err(_) => Ok(None),
        }
    }
}
