use axum::{
    extract::State,
    http::StatusCode,
    routing::{post, put},
    Json, Router,
};

use crate::{
    api::{ApiJson, AppState, AuthUser},
    error::AppResult,
    models::{AuthResponse, LoginRequest, ProfileUpdate, RegisterRequest},
};

/// Routes under /api/auth
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/profile", put(update_profile))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let response = state.auth.login(request).await?;
    Ok(Json(response))
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let response = state.auth.register(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> AppResult<Json<AuthResponse>> {
    let response = state.auth.update_profile(user.id, update).await?;
    Ok(Json(response))
}
