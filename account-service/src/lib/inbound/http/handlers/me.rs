use axum::http::StatusCode;
use axum::Extension;

use super::register::UserProfileData;
use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::middleware::AuthenticatedUser;

pub async fn me(
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> Result<ApiSuccess<UserProfileData>, ApiError> {
    Ok(ApiSuccess::new(StatusCode::OK, (&user).into()))
}
