//! Activity catalog endpoints.

use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
    Json, Router,
};
use edumatch_common::AppResult;
use edumatch_core::{CreateActivityInput, FeedbackSummary, TagSet, UpdateActivityInput};
use edumatch_db::entities::activity::{self, Difficulty};
use serde::Serialize;

use crate::{
    extractors::CurrentActor,
    middleware::AppState,
    response::{ack, Ack, ApiResponse},
};

/// Activity response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResponse {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub difficulty: Difficulty,
    pub tags: TagSet,
    pub created_by: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<activity::Model> for ActivityResponse {
    fn from(a: activity::Model) -> Self {
        Self {
            tags: TagSet::from_json(&a.tags),
            id: a.id,
            title: a.title,
            description: a.description,
            difficulty: a.difficulty,
            created_by: a.created_by,
            created_at: a.created_at.to_rfc3339(),
            updated_at: a.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Any authenticated caller may browse the catalog.
async fn list(
    CurrentActor(_actor): CurrentActor,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<ActivityResponse>>> {
    let activities = state.activity_service.list().await?;
    Ok(ApiResponse::ok(activities.into_iter().map(Into::into).collect()))
}

async fn create(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Json(req): Json<CreateActivityInput>,
) -> AppResult<Response> {
    let activity = state.activity_service.create(&actor, req).await?;
    Ok(ApiResponse::created(ActivityResponse::from(activity)))
}

async fn show(
    CurrentActor(_actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ActivityResponse>> {
    let activity = state.activity_service.get(&id).await?;
    Ok(ApiResponse::ok(activity.into()))
}

async fn update(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateActivityInput>,
) -> AppResult<ApiResponse<ActivityResponse>> {
    let activity = state.activity_service.update(&actor, &id, req).await?;
    Ok(ApiResponse::ok(activity.into()))
}

async fn delete(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Ack>> {
    state.activity_service.delete(&actor, &id).await?;
    Ok(ack())
}

async fn feedback_summary(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<FeedbackSummary>> {
    let summary = state
        .feedback_service
        .summarize_activity(&actor, &id)
        .await?;
    Ok(ApiResponse::ok(summary))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/activities", get(list).post(create))
        .route("/activities/{id}", get(show).put(update).delete(delete))
        .route("/activities/{id}/feedback/summary", get(feedback_summary))
}
