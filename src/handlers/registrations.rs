use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::Result,
    models::{
        registration::{RegistrationStatus, RegistrationView},
        session::AdminClaims,
    },
    services::registrations as registration_service,
    state::AppState,
    validation::registration::RegistrationForm,
};

/// The response payload for a new registration.
#[derive(Serialize)]
pub struct SubmitResponse {
    pub message: String,
    pub id: Uuid,
    pub sequence: i32,
}

/// The request payload for a status change.
#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: RegistrationStatus,
}

/// The response payload for the registration list.
#[derive(Serialize)]
pub struct ListResponse {
    pub registrations: Vec<RegistrationView>,
}

/// The response payload for a single registration.
#[derive(Serialize)]
pub struct DetailResponse {
    pub registration: RegistrationView,
}

/// Accepts a public registration.
#[axum::debug_handler]
pub async fn submit(
    State(state): State<AppState>,
    Json(form): Json<RegistrationForm>,
) -> Result<Response> {
    let registration = registration_service::submit(&state, form).await?;

    let response = SubmitResponse {
        message: "Registration successful".to_string(),
        id: registration.id,
        sequence: registration.sequence,
    };

    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// Lists registrations for an admin.
#[axum::debug_handler]
pub async fn list(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminClaims>,
) -> Result<Response> {
    tracing::debug!("📋 Registration list requested by {}", admin.username);

    let registrations = registration_service::list(&state).await?;

    Ok(Json(ListResponse { registrations }).into_response())
}

/// Shows one registration to an admin.
#[axum::debug_handler]
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    let registration = registration_service::get(&state, &id).await?;

    Ok(Json(DetailResponse { registration }).into_response())
}

/// Adds a registration from the admin back office.
#[axum::debug_handler]
pub async fn create(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminClaims>,
    Json(form): Json<RegistrationForm>,
) -> Result<Response> {
    let registration = registration_service::create(&state, form, &admin.username).await?;

    Ok((StatusCode::CREATED, Json(DetailResponse { registration })).into_response())
}

/// Edits a registration's details.
#[axum::debug_handler]
pub async fn update(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminClaims>,
    Path(id): Path<Uuid>,
    Json(form): Json<RegistrationForm>,
) -> Result<Response> {
    tracing::info!("📝 {} edits registration {}", admin.username, id);

    let registration = registration_service::update(&state, &id, form).await?;

    Ok(Json(DetailResponse { registration }).into_response())
}

/// Changes a registration's status.
#[axum::debug_handler]
pub async fn update_status(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminClaims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusRequest>,
) -> Result<Response> {
    tracing::info!(
        "📝 {} sets registration {} to {}",
        admin.username,
        id,
        payload.status.as_str()
    );

    let registration = registration_service::set_status(&state, &id, payload.status).await?;

    Ok(Json(DetailResponse { registration }).into_response())
}

/// Deletes a registration.
#[axum::debug_handler]
pub async fn delete(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminClaims>,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    tracing::info!("🗑️  {} deletes registration {}", admin.username, id);

    registration_service::delete(&state, &id).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}
