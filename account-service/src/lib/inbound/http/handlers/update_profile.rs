use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use serde::Deserializer;

use super::register::UserProfileData;
use super::ApiError;
use super::ApiSuccess;
use crate::domain::user::models::Address;
use crate::domain::user::models::FullName;
use crate::domain::user::models::UpdateProfileCommand;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;
use crate::user::errors::UserError;
use crate::user::ports::UserServicePort;

/// HTTP request body for a partial profile update (raw JSON)
///
/// Omitted fields are left unchanged; `null` clears a nullable field.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default, deserialize_with = "present")]
    full_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    date_of_birth: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "present")]
    address: Option<Option<String>>,
    #[serde(default)]
    send_reminders: Option<bool>,
}

/// Marks a field that appeared in the body, even as `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl UpdateProfileRequest {
    fn try_into_command(self) -> Result<UpdateProfileCommand, UserError> {
        Ok(UpdateProfileCommand {
            full_name: self
                .full_name
                .map(|name| name.map(FullName::new).transpose())
                .transpose()?,
            date_of_birth: self.date_of_birth,
            address: self
                .address
                .map(|address| address.map(Address::new).transpose())
                .transpose()?,
            send_reminders: self.send_reminders,
        })
    }
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<ApiSuccess<UserProfileData>, ApiError> {
    let command = req.try_into_command()?;

    state
        .user_service
        .update_profile(&user.id, command)
        .await
        .map_err(ApiError::from)
        .map(|ref user| ApiSuccess::new(StatusCode::OK, user.into()))
}
