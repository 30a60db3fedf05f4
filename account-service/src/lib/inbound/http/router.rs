use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use auth::IdentityResolver;
use auth::PrincipalLookup;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::routing::put;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::change_password::change_password;
use super::handlers::delete_account::delete_account;
use super::handlers::forgot_password::forgot_password;
use super::handlers::login::login;
use super::handlers::me::me;
use super::handlers::register::register;
use super::handlers::reset_password::reset_password;
use super::handlers::update_profile::update_profile;
use super::middleware::authenticate as auth_middleware;
use crate::domain::user::models::User;
use crate::user::errors::UserError;
use crate::user::ports::UserServicePort;

/// User store as seen by the identity resolver.
pub type UserLookup = dyn PrincipalLookup<Principal = User, Error = UserError>;

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<dyn UserServicePort>,
    pub identity_resolver: IdentityResolver<UserLookup>,
}

/// Build the account HTTP API.
///
/// `user_service` serves both the account operations and the principal
/// lookup behind every protected route.
pub fn create_router<S>(user_service: Arc<S>, authenticator: Arc<Authenticator>) -> Router
where
    S: UserServicePort + PrincipalLookup<Principal = User, Error = UserError>,
{
    let lookup: Arc<UserLookup> = Arc::clone(&user_service) as Arc<UserLookup>;
    let state = AppState {
        identity_resolver: authenticator.resolver(lookup),
        user_service,
    };

    let public_routes = Router::new()
        .route("/users/register", post(register))
        .route("/users/token", post(login))
        .route("/users/forgot-password", post(forgot_password))
        .route("/users/reset-password", post(reset_password));

    let protected_routes = Router::new()
        .route(
            "/users/me",
            get(me).put(update_profile).delete(delete_account),
        )
        .route("/users/me/password", put(change_password))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Headers are left out of the span: Authorization carries the bearer token
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
