//! API Handlers
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tara_core::{
    country_code, GuidanceResponse, ProfileUpdate, TaraError, TravelRequest, TARA_VERSION,
};
use tracing::{error, info};

use crate::AppState;

pub const SERVICE_NAME: &str = "TARA Migration Assistant";
pub const DEFAULT_HISTORY_LIMIT: usize = 10;
pub const MAX_HISTORY_LIMIT: usize = 100;

pub async fn check(
    State(state): State<AppState>,
    Json(request): Json<TravelRequest>,
) -> Json<GuidanceResponse> {
    let resolved = state.resolver.resolve(request).await;
    state.metrics.record(resolved.status);
    Json(GuidanceResponse::from_resolved(&resolved))
}

pub async fn health() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": SERVICE_NAME,
            "version": TARA_VERSION,
        })),
    )
}

pub async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> (StatusCode, Json<Value>) {
    match state.profiles.get(&user_id).await {
        Ok(Some(profile)) => (
            StatusCode::OK,
            Json(json!({ "status": "success", "profile": profile })),
        ),
        Ok(None) => (
            StatusCode::OK,
            Json(json!({
                "status": "not_found",
                "message": "No profile found for this user",
            })),
        ),
        Err(err) => store_failure("Failed to load profile", err),
    }
}

#[derive(Debug, Deserialize)]
pub struct ProfileUpdateRequest {
    pub user_id: String,
    #[serde(flatten)]
    pub update: ProfileUpdate,
}

/// Explicit update: the only path that overwrites a stored citizenship.
pub async fn update_profile(
    State(state): State<AppState>,
    Json(body): Json<ProfileUpdateRequest>,
) -> (StatusCode, Json<Value>) {
    if body.user_id.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "status": "error", "message": "user_id is required" })),
        );
    }

    let update = match normalize_update(body.update) {
        Ok(update) => update,
        Err(message) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "status": "error", "message": message })),
            )
        }
    };
    match state.profiles.upsert(&body.user_id, update).await {
        Ok(()) => {
            info!(user_id = %body.user_id, "profile updated explicitly");
            (
                StatusCode::OK,
                Json(json!({
                    "status": "success",
                    "message": "Profile updated successfully",
                })),
            )
        }
        Err(err) => store_failure("Failed to update profile", err),
    }
}

/// Uppercases the code, deriving it from the name when only a name is sent.
/// Empty updates and a code sent without a name are rejected.
fn normalize_update(mut update: ProfileUpdate) -> Result<ProfileUpdate, &'static str> {
    if update.is_empty() {
        return Err("No profile fields to update");
    }

    let has_name = update
        .citizenship
        .as_deref()
        .is_some_and(|name| !name.trim().is_empty());
    let code = update
        .citizenship_code
        .as_deref()
        .or(update.citizenship.as_deref())
        .map(country_code)
        .filter(|code| !code.is_empty());

    if code.is_some() && !has_name {
        return Err("citizenship_code must be sent together with citizenship");
    }
    if code.is_some() {
        update.citizenship_code = code;
    }
    Ok(update)
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<usize>,
}

pub async fn history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> (StatusCode, Json<Value>) {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .min(MAX_HISTORY_LIMIT);

    match state.profiles.recent_interactions(&user_id, limit).await {
        Ok(interactions) => (
            StatusCode::OK,
            Json(json!({
                "status": "success",
                "user_id": user_id,
                "count": interactions.len(),
                "interactions": interactions,
            })),
        ),
        Err(err) => store_failure("Failed to load history", err),
    }
}

/// Echoes the parsed request and how it would be interpreted.
pub async fn debug_request(Json(request): Json<TravelRequest>) -> Json<Value> {
    let identity_key = request.profile.identity_key();
    let has_citizenship = !request.profile.nationalities.is_empty();
    Json(json!({
        "received_data": request,
        "interpretation": {
            "destination": request.destination,
            "destination_code": country_code(&request.destination),
            "purpose": request.purpose,
            "user_id": identity_key,
            "user_name": request.profile.display_name,
            "citizenship_data": request.profile.nationalities,
            "has_citizenship": has_citizenship,
        },
    }))
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        ),
        Err(err) => {
            error!(error = %err, "metrics encoding failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                err.to_string(),
            )
        }
    }
}

fn store_failure(message: &str, err: TaraError) -> (StatusCode, Json<Value>) {
    error!(error = %err, "{}", message);
    let status = match err {
        TaraError::InputError(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(json!({
            "status": "error",
            "message": message,
            "error_details": err.to_string(),
        })),
    )
}
