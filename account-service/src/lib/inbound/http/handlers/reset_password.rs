use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::MessageData;
use crate::domain::user::models::NewPassword;
use crate::domain::user::models::ResetPasswordCommand;
use crate::inbound::http::router::AppState;
use crate::user::errors::UserError;
use crate::user::ports::UserServicePort;

/// HTTP request body for redeeming a reset token (raw JSON)
#[derive(Clone, Deserialize)]
pub struct ResetPasswordRequest {
    token: String,
    new_password: String,
}

impl ResetPasswordRequest {
    fn try_into_command(self) -> Result<ResetPasswordCommand, UserError> {
        Ok(ResetPasswordCommand {
            token: self.token,
            new_password: NewPassword::new(self.new_password)?,
        })
    }
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    let command = req.try_into_command()?;

    state
        .user_service
        .reset_password(command)
        .await
        .map_err(ApiError::from)
        .map(|_| {
            ApiSuccess::new(
                StatusCode::OK,
                MessageData::new("Your password has been reset successfully."),
            )
        })
}
