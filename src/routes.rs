use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
};
use std::sync::Arc;
use tower_cookies::CookieManagerLayer;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use http::{HeaderValue, Method, header};
use std::time::Duration;
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{
    error::{AppError, Result},
    handlers,
    middleware_layer::{self, auth::AdminGuard},
    state::AppState,
};

/// Builds the full application router.
///
/// Layer order, outermost first: tracing, CORS, cookies, session gate,
/// route specific middleware.
pub fn build_router(state: AppState) -> Result<Router> {
    let admin_governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(20)
            .burst_size(200)
            .use_headers()
            .finish()
            .ok_or_else(|| AppError::Configuration("Invalid governor configuration".to_string()))?,
    );

    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::COOKIE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(86400));

    let login_routes = Router::new()
        .route("/api/auth/login", post(handlers::auth::login))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::rate_limit::rate_limit_login,
        ))
        .with_state(state.clone());

    let session_routes = Router::new()
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/verify", get(handlers::auth::verify))
        .route("/api/registration", post(handlers::registrations::submit))
        .with_state(state.clone());

    let admin_routes = Router::new()
        .route(
            "/api/admin/registrations",
            get(handlers::registrations::list).post(handlers::registrations::create),
        )
        .route(
            "/api/admin/registrations/{id}",
            get(handlers::registrations::detail)
                .put(handlers::registrations::update)
                .delete(handlers::registrations::delete),
        )
        .route(
            "/api/admin/registrations/{id}/status",
            patch(handlers::registrations::update_status),
        )
        .layer(GovernorLayer::new(admin_governor_conf))
        .route_layer(from_fn_with_state(
            AdminGuard::from_state(&state),
            middleware_layer::auth::require_admin,
        ))
        .with_state(state.clone());

    let app = Router::new()
        .merge(login_routes)
        .merge(session_routes)
        .merge(admin_routes)
        .fallback_service(ServeDir::new(&state.config.static_dir))
        .layer(from_fn_with_state(
            state.gate.clone(),
            middleware_layer::gate::session_gate,
        ))
        .layer(CookieManagerLayer::new())
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default())
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        );

    Ok(app)
}
