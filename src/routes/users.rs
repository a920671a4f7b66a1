use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};

use crate::{
    api::{ApiJson, AppState, AuthUser},
    error::AppResult,
    models::{HistoryEntry, HistoryUpdate, WatchlistItem},
};

/// Routes under /api/users, all of them require a bearer token
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/watchlist", get(get_watchlist).post(add_to_watchlist))
        .route("/watchlist/:id", delete(remove_from_watchlist))
        .route("/history", get(get_watch_history).post(update_watch_history))
        .route("/history/:id", delete(remove_from_watch_history))
}

pub async fn get_watchlist(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Vec<WatchlistItem>>> {
    Ok(Json(state.users.watchlist(user.id).await?))
}

pub async fn add_to_watchlist(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(item): ApiJson<WatchlistItem>,
) -> AppResult<(StatusCode, Json<Vec<WatchlistItem>>)> {
    let watchlist = state.users.add_to_watchlist(user.id, item).await?;
    Ok((StatusCode::CREATED, Json(watchlist)))
}

pub async fn remove_from_watchlist(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<WatchlistItem>>> {
    Ok(Json(state.users.remove_from_watchlist(user.id, &id).await?))
}

pub async fn get_watch_history(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Vec<HistoryEntry>>> {
    Ok(Json(state.users.watch_history(user.id).await?))
}

pub async fn update_watch_history(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(update): ApiJson<HistoryUpdate>,
) -> AppResult<Json<Vec<HistoryEntry>>> {
    Ok(Json(state.users.record_history(user.id, update).await?))
}

pub async fn remove_from_watch_history(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<HistoryEntry>>> {
    Ok(Json(state.users.remove_from_history(user.id, &id).await?))
}
