//! Persisted recommendation endpoints.

use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
    Json, Router,
};
use edumatch_common::AppResult;
use edumatch_core::{CreateFeedbackInput, CreateRecommendationInput};
use edumatch_db::entities::recommendation;
use serde::{Deserialize, Serialize};

use super::feedback::FeedbackResponse;
use crate::{
    extractors::CurrentActor,
    middleware::AppState,
    response::{ack, Ack, ApiResponse},
};

/// Recommendation response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    pub id: String,
    pub student_id: String,
    pub activity_id: String,
    pub score: f64,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<recommendation::Model> for RecommendationResponse {
    fn from(r: recommendation::Model) -> Self {
        Self {
            id: r.id,
            student_id: r.student_id,
            activity_id: r.activity_id,
            score: r.score,
            created_at: r.created_at.to_rfc3339(),
            updated_at: r.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Update score request.
#[derive(Debug, Deserialize)]
pub struct UpdateScoreRequest {
    pub score: f64,
}

async fn list_all(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<RecommendationResponse>>> {
    let recommendations = state.recommendation_service.list_all(&actor).await?;
    Ok(ApiResponse::ok(
        recommendations.into_iter().map(Into::into).collect(),
    ))
}

async fn create(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Json(req): Json<CreateRecommendationInput>,
) -> AppResult<Response> {
    let recommendation = state.recommendation_service.create(&actor, req).await?;
    Ok(ApiResponse::created(RecommendationResponse::from(
        recommendation,
    )))
}

async fn show(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<RecommendationResponse>> {
    let recommendation = state.recommendation_service.get(&actor, &id).await?;
    Ok(ApiResponse::ok(recommendation.into()))
}

async fn update_score(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateScoreRequest>,
) -> AppResult<ApiResponse<RecommendationResponse>> {
    let recommendation = state
        .recommendation_service
        .update_score(&actor, &id, req.score)
        .await?;
    Ok(ApiResponse::ok(recommendation.into()))
}

async fn delete(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Ack>> {
    state.recommendation_service.delete(&actor, &id).await?;
    Ok(ack())
}

async fn list_feedback(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<FeedbackResponse>>> {
    let feedback = state
        .feedback_service
        .list_for_recommendation(&actor, &id)
        .await?;
    Ok(ApiResponse::ok(feedback.into_iter().map(Into::into).collect()))
}

async fn create_feedback(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<CreateFeedbackInput>,
) -> AppResult<Response> {
    let feedback = state.feedback_service.create(&actor, &id, req).await?;
    Ok(ApiResponse::created(FeedbackResponse::from(feedback)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recommendations", get(list_all).post(create))
        .route(
            "/recommendations/{id}",
            get(show).put(update_score).delete(delete),
        )
        .route(
            "/recommendations/{id}/feedback",
            get(list_feedback).post(create_feedback),
        )
}
