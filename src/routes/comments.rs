use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::{
    api::{ApiJson, AppState, AuthUser},
    error::AppResult,
    models::{Comment, NewComment},
};

/// Routes under /api/comments
///
/// `GET /:id` takes a content id and is public, `DELETE /:id` takes a comment id.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(add_comment))
        .route("/:id", get(get_comments).delete(delete_comment))
}

pub async fn add_comment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(request): ApiJson<NewComment>,
) -> AppResult<(StatusCode, Json<Comment>)> {
    let comment = state.comments.add(&user, request).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn get_comments(
    State(state): State<AppState>,
    Path(content_id): Path<String>,
) -> AppResult<Json<Vec<Comment>>> {
    Ok(Json(state.comments.list(&content_id).await?))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    state.comments.delete(&user, &id).await?;
    Ok(Json(json!({ "message": "Comment removed" })))
}
