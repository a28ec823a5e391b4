use axum::{
    Extension, Router,
    body::Body,
    http::{Request, StatusCode, header},
    middleware::from_fn_with_state,
    routing::get,
};
use chrono::Duration;
use tower::ServiceExt;
use tower_cookies::CookieManagerLayer;
use uuid::Uuid;

use cisa::{
    cookies::SessionCookie,
    crypto::token::TokenSigner,
    middleware_layer::{
        auth::{AdminGuard, require_admin},
        gate::{GatePolicy, SessionGate},
    },
    models::session::{AdminClaims, Principal},
};

fn gate() -> SessionGate {
    let signer = TokenSigner::new(b"admin-guard-test-secret", Duration::hours(24)).unwrap();
    SessionGate::new(GatePolicy::default(), signer, SessionCookie::new(false, 86_400))
}

/// The admin API with the token-only guard (no account lookup).
fn app(gate: SessionGate) -> Router {
    Router::new()
        .route(
            "/api/admin/registrations",
            get(|Extension(claims): Extension<AdminClaims>| async move { claims.username }),
        )
        .route_layer(from_fn_with_state(AdminGuard::new(gate, None), require_admin))
        .layer(CookieManagerLayer::new())
}

fn request(token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri("/api/admin/registrations");
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("admin-token={}", token));
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn missing_cookie_is_401_json_not_a_redirect() {
    let response = app(gate()).oneshot(request(None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::LOCATION).is_none());
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    assert_eq!(body_json(response).await["error"], "Unauthorized");
}

#[tokio::test]
async fn invalid_cookie_is_401() {
    let response = app(gate())
        .oneshot(request(Some("forged.token")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Unauthorized");
}

#[tokio::test]
async fn valid_session_reaches_handler_with_claims() {
    let gate = gate();
    let token = gate
        .signer()
        .issue(&Principal {
            id: Uuid::new_v4(),
            username: "registrar".to_string(),
            role: "admin".to_string(),
        })
        .unwrap();

    let response = app(gate).oneshot(request(Some(&token.value))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"registrar");
}
