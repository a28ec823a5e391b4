use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{admin::AdminProfile, session::Principal},
    services::auth as auth_service,
    state::AppState,
    validation::auth::*,
};

/// The request payload for admin login.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// The response payload for a successful login.
#[derive(Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub admin: AdminProfile,
}

/// The response payload for logout.
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// The principal reported by the verify endpoint.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionAdmin {
    pub admin_id: Uuid,
    pub username: String,
    pub role: String,
}

/// The response payload for session verification.
#[derive(Serialize)]
pub struct VerifyResponse {
    pub message: String,
    pub admin: SessionAdmin,
}

/// Handles admin login.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<LoginRequest>,
) -> Result<Response> {
    tracing::info!("🔐 Login attempt - Payload: {:?}", payload);
    validate_username(&payload.username)?;
    validate_password(&payload.password)?;

    let admin =
        auth_service::authenticate_admin(&state.db, &payload.username, &payload.password).await?;

    let issued = state.gate.signer().issue(&Principal::from(&admin))?;
    state.gate.cookie().set(&cookies, issued.value);

    tracing::info!("✅ Admin logged in: {}", admin.id);

    let response = LoginResponse {
        message: "Login successful".to_string(),
        admin: AdminProfile::from(&admin),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Handles admin logout. Always succeeds and always clears the cookie.
#[axum::debug_handler]
pub async fn logout(State(state): State<AppState>, cookies: Cookies) -> Result<Response> {
    state.gate.cookie().clear(&cookies);

    tracing::info!("👋 Admin logged out");

    let response = MessageResponse {
        message: "Logout successful".to_string(),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Reports the admin behind the current session cookie.
#[axum::debug_handler]
pub async fn verify(State(state): State<AppState>, cookies: Cookies) -> Result<Response> {
    let claims = state
        .gate
        .verify_session(&cookies)
        .ok_or_else(|| AppError::Authentication("Unauthorized".to_string()))?;

    let response = VerifyResponse {
        message: "Authenticated".to_string(),
        admin: SessionAdmin {
            admin_id: claims.admin_id,
            username: claims.username,
            role: claims.role,
        },
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}
