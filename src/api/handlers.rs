use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::models::{Content, FeedbackKind, HistoryEntry, PreferenceTriple, UserProfile};
use crate::services::dialog::DialogReply;
use crate::services::feedback::FeedbackOutcome;

use super::AppState;

// Request types

#[derive(Debug, Deserialize)]
pub struct DialogStartRequest {
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct DialogChooseRequest {
    pub user_id: i64,
    pub choice: String,
}

/// Missing preference fields act as wildcards on their dimension
#[derive(Debug, Deserialize)]
pub struct RecommendationsRequest {
    pub user_id: Option<i64>,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub depth: String,
    #[serde(default)]
    pub features: String,
}

impl RecommendationsRequest {
    fn preferences(&self) -> PreferenceTriple {
        PreferenceTriple::new(
            self.genre.clone(),
            self.depth.clone(),
            self.features.clone(),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub user_id: i64,
    pub content_id: i64,
    pub feedback: FeedbackKind,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Opens a dialog for the user and returns the genre step
pub async fn start_dialog(
    State(state): State<AppState>,
    Json(request): Json<DialogStartRequest>,
) -> AppResult<Json<DialogReply>> {
    let reply = state.dialog.start(request.user_id).await;
    Ok(Json(reply))
}

/// Advances the user's dialog with a chosen option
pub async fn choose(
    State(state): State<AppState>,
    Json(request): Json<DialogChooseRequest>,
) -> AppResult<Json<DialogReply>> {
    let reply = state.dialog.choose(request.user_id, &request.choice).await?;
    Ok(Json(reply))
}

/// One-shot recommendation query outside the dialog flow
pub async fn recommendations(
    State(state): State<AppState>,
    Json(request): Json<RecommendationsRequest>,
) -> AppResult<Json<Vec<Content>>> {
    let results = state
        .recommender
        .recommend(&request.preferences(), request.user_id)
        .await?;
    Ok(Json(results))
}

/// Records a like/dislike for a shown catalog entry
pub async fn feedback(
    State(state): State<AppState>,
    Json(request): Json<FeedbackRequest>,
) -> AppResult<Json<FeedbackOutcome>> {
    let outcome = state
        .feedback
        .record(request.user_id, request.content_id, request.feedback)
        .await?;
    Ok(Json(outcome))
}

/// Stored profile for a user
pub async fn user_profile(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<UserProfile>> {
    let profile = state
        .store
        .user_profile(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {} not found", user_id)))?;
    Ok(Json(profile))
}

/// The user's recent feedback history, newest first
pub async fn user_history(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<Vec<HistoryEntry>>> {
    let history = state
        .store
        .recent_history(user_id, query.limit.unwrap_or(10))
        .await?;
    Ok(Json(history))
}

/// Full catalog, id ascending
pub async fn catalog(State(state): State<AppState>) -> AppResult<Json<Vec<Content>>> {
    let catalog = state.store.catalog().await?;
    Ok(Json(catalog))
}

/// Single catalog entry
pub async fn content_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Content>> {
    let content = state.store.content_by_id(id).await?;
    Ok(Json(content))
}
