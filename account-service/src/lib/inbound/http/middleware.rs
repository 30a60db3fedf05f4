use auth::IdentityError;
use axum::extract::Request;
use axum::extract::State;
use axum::http::header;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use crate::domain::user::models::User;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::CREDENTIALS_REJECTED;
use crate::inbound::http::router::AppState;

/// Extension type carrying the resolved account into protected handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Middleware that resolves the bearer token to an account and adds it to request extensions
///
/// Every rejection answers with the same 401 body; the reason is only logged.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers()).map(str::to_owned);

    let user = state
        .identity_resolver
        .resolve(token.as_deref())
        .await
        .map_err(|e| match e {
            IdentityError::LookupFailed(_) => {
                ApiError::InternalServerError("Internal server error".to_string())
            }
            rejected => {
                tracing::info!(reason = %rejected, "Request not authenticated");
                ApiError::Unauthorized(CREDENTIALS_REJECTED.to_string())
            }
        })?;

    tracing::debug!(user_id = %user.id, "Request authenticated");
    req.extensions_mut().insert(AuthenticatedUser(user));

    Ok(next.run(req).await)
}

/// Token of an `Authorization: Bearer <token>` header. Any other scheme counts as absent.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use auth::AuthSettings;
    use auth::Authenticator;
    use auth::HashingSettings;
    use axum::body::Body;
    use axum::http::HeaderValue;
    use axum::http::StatusCode;
    use axum::Router;
    use chrono::Utc;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::domain::user::models::EmailAddress;
    use crate::domain::user::service::UserService;
    use crate::inbound::http::router::create_router;
    use crate::outbound::mailer::LogMailer;
    use crate::repositories::InMemoryUserRepository;
    use crate::user::ports::UserRepository;

    struct Harness {
        router: Router,
        repository: Arc<InMemoryUserRepository>,
        authenticator: Arc<Authenticator>,
        user: User,
    }

    async fn harness() -> Harness {
        let mut settings = AuthSettings::new("middleware_test_secret_32_bytes_long!");
        settings.hashing = HashingSettings {
            memory_cost_kib: 1024,
            iterations: 1,
            parallelism: 1,
        };
        let authenticator = Arc::new(Authenticator::from_settings(&settings).unwrap());
        let repository = Arc::new(InMemoryUserRepository::new());
        let mailer = Arc::new(LogMailer::new("http://localhost:3000"));

        let user = repository
            .create(User::new(
                EmailAddress::new("alice@example.com".to_string()).unwrap(),
                None,
                authenticator.hash_password("Secret123").unwrap(),
            ))
            .await
            .unwrap();

        let service = Arc::new(UserService::new(
            Arc::clone(&repository),
            mailer,
            Arc::clone(&authenticator),
        ));

        Harness {
            router: create_router(service, Arc::clone(&authenticator)),
            repository,
            authenticator,
            user,
        }
    }

    fn me_request(authorization: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri("/users/me");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn assert_rejected(router: Router, request: Request) {
        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE),
            Some(&HeaderValue::from_static("Bearer"))
        );

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["data"]["message"], CREDENTIALS_REJECTED);
    }

    #[tokio::test]
    async fn test_valid_access_token_reaches_handler() {
        let h = harness().await;
        let token = h
            .authenticator
            .issue_access_token("alice@example.com", false, Utc::now())
            .unwrap();

        let response = h
            .router
            .oneshot(me_request(Some(&format!("Bearer {}", token))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["data"]["email"], "alice@example.com");
        assert_eq!(body["data"]["id"], h.user.id.to_string());
        assert!(body["data"].get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_missing_header_rejected() {
        let h = harness().await;
        assert_rejected(h.router, me_request(None)).await;
    }

    #[tokio::test]
    async fn test_other_scheme_rejected() {
        let h = harness().await;
        assert_rejected(h.router, me_request(Some("Basic YWxpY2U6U2VjcmV0MTIz"))).await;
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let h = harness().await;
        assert_rejected(h.router, me_request(Some("Bearer not.a.token"))).await;
    }

    #[tokio::test]
    async fn test_reset_token_rejected() {
        let h = harness().await;
        let token = h
            .authenticator
            .issue_reset_token("alice@example.com", Utc::now())
            .unwrap();

        assert_rejected(h.router, me_request(Some(&format!("Bearer {}", token)))).await;
    }

    #[tokio::test]
    async fn test_deleted_account_rejected() {
        let h = harness().await;
        let token = h
            .authenticator
            .issue_access_token("alice@example.com", true, Utc::now())
            .unwrap();
        h.repository.delete(&h.user.id).await.unwrap();

        assert_rejected(h.router, me_request(Some(&format!("Bearer {}", token)))).await;
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("bearer abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Token abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer"));
        assert_eq!(bearer_token(&headers), None);
    }
}
