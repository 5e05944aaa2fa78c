//! Feedback endpoints.

use axum::{
    extract::{Path, State},
    routing::put,
    Json, Router,
};
use edumatch_common::AppResult;
use edumatch_core::UpdateFeedbackInput;
use edumatch_db::entities::{feedback, user::UserRole};
use serde::Serialize;

use crate::{
    extractors::CurrentActor,
    middleware::AppState,
    response::{ack, Ack, ApiResponse},
};

/// Feedback response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
    pub id: String,
    pub recommendation_id: String,
    pub student_id: String,
    pub activity_id: String,
    pub rating: i32,
    pub helpful: Option<bool>,
    pub comment: Option<String>,
    pub created_by: UserRole,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<feedback::Model> for FeedbackResponse {
    fn from(f: feedback::Model) -> Self {
        Self {
            id: f.id,
            recommendation_id: f.recommendation_id,
            student_id: f.student_id,
            activity_id: f.activity_id,
            rating: f.rating,
            helpful: f.helpful,
            comment: f.comment,
            created_by: f.created_by,
            created_at: f.created_at.to_rfc3339(),
            updated_at: f.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

async fn update(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateFeedbackInput>,
) -> AppResult<ApiResponse<FeedbackResponse>> {
    let feedback = state.feedback_service.update(&actor, &id, req).await?;
    Ok(ApiResponse::ok(feedback.into()))
}

async fn delete(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Ack>> {
    state.feedback_service.delete(&actor, &id).await?;
    Ok(ack())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/feedback/{id}", put(update).delete(delete))
}
