use async_trait::async_trait;

use crate::domain::user::models::EmailAddress;
use crate::domain::user::ports::PasswordResetMailer;
use crate::user::errors::MailerError;

/// Log target of the reset link. Off under the default log filter.
pub const MAIL_TARGET: &str = "account_service::mail";

/// Reset-link mailer that hands the message to the log instead of an SMTP relay.
///
/// The link embeds a live reset token, so it goes to `MAIL_TARGET` at `debug`
/// level and only shows up when that target is enabled explicitly.
pub struct LogMailer {
    frontend_url: String,
}

impl LogMailer {
    pub fn new(frontend_url: impl Into<String>) -> Self {
        Self {
            frontend_url: frontend_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Link to the web client's reset page carrying `token`.
    pub fn reset_link(&self, token: &str) -> String {
        format!("{}/Reset_Password?token={}", self.frontend_url, token)
    }
}

#[async_trait]
impl PasswordResetMailer for LogMailer {
    async fn send_password_reset(
        &self,
        recipient: &EmailAddress,
        token: &str,
    ) -> Result<(), MailerError> {
        tracing::info!(recipient = %recipient, "Password reset email queued");
        tracing::debug!(
            target: MAIL_TARGET,
            link = %self.reset_link(token),
            "Password reset link"
        );
        Ok(())
    }
}
