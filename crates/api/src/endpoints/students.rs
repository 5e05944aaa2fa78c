//! Student endpoints, including per-student matches, recommendations and feedback.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use edumatch_common::AppResult;
use edumatch_core::{ActivityMatch, CreateStudentInput, SaveTopMatchOutcome, UpdateStudentInput};
use edumatch_db::entities::{student, user};
use serde::Serialize;

use super::{
    activities::ActivityResponse, auth::UserResponse, feedback::FeedbackResponse,
    recommendations::RecommendationResponse,
};
use crate::{
    extractors::CurrentActor,
    middleware::AppState,
    response::{ack, Ack, ApiResponse},
};

/// Student response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentResponse {
    pub id: String,
    pub user_id: String,
    pub teacher_id: String,
    pub disability: Option<String>,
    pub learning_style: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
}

impl StudentResponse {
    pub fn new(s: student::Model, user: Option<user::Model>) -> Self {
        Self {
            id: s.id,
            user_id: s.user_id,
            teacher_id: s.teacher_id,
            disability: s.disability,
            learning_style: s.learning_style,
            created_at: s.created_at.to_rfc3339(),
            updated_at: s.updated_at.map(|t| t.to_rfc3339()),
            user: user.map(Into::into),
        }
    }
}

async fn list(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<StudentResponse>>> {
    let students = state.student_service.list(&actor).await?;

    Ok(ApiResponse::ok(
        students
            .into_iter()
            .map(|(s, u)| StudentResponse::new(s, u))
            .collect(),
    ))
}

async fn create(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Json(req): Json<CreateStudentInput>,
) -> AppResult<Response> {
    let (student, user) = state.student_service.create(&actor, req).await?;
    Ok(ApiResponse::created(StudentResponse::new(student, Some(user))))
}

async fn show(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<StudentResponse>> {
    let student = state.student_service.get(&actor, &id).await?;
    Ok(ApiResponse::ok(StudentResponse::new(student, None)))
}

async fn update(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStudentInput>,
) -> AppResult<ApiResponse<StudentResponse>> {
    let student = state.student_service.update(&actor, &id, req).await?;
    Ok(ApiResponse::ok(StudentResponse::new(student, None)))
}

async fn delete(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Ack>> {
    state.student_service.delete(&actor, &id).await?;
    Ok(ack())
}

/// Live ranked matches; nothing is stored.
async fn matches(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<ActivityMatch>>> {
    let matches = state
        .recommendation_service
        .list_matches(&actor, &id)
        .await?;
    Ok(ApiResponse::ok(matches))
}

async fn list_recommendations(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<RecommendationResponse>>> {
    let recommendations = state
        .recommendation_service
        .list_for_student(&actor, &id)
        .await?;

    Ok(ApiResponse::ok(
        recommendations.into_iter().map(Into::into).collect(),
    ))
}

/// Saved top match. Both fields are null when nothing matched.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveTopMatchResponse {
    pub recommendation: Option<RecommendationResponse>,
    pub activity: Option<ActivityResponse>,
}

/// Persist the student's top match: 201 when created, 200 with nulls when
/// the catalog has nothing relevant.
async fn save_top_match(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let outcome = state
        .recommendation_service
        .save_top_match(&actor, &id)
        .await?;

    Ok(match outcome {
        SaveTopMatchOutcome::Created {
            recommendation,
            activity,
        } => ApiResponse::created(SaveTopMatchResponse {
            recommendation: Some(recommendation.into()),
            activity: Some(activity.into()),
        }),
        SaveTopMatchOutcome::NoMatch => ApiResponse::ok(SaveTopMatchResponse {
            recommendation: None,
            activity: None,
        })
        .into_response(),
    })
}

async fn list_feedback(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<FeedbackResponse>>> {
    let feedback = state.feedback_service.list_for_student(&actor, &id).await?;
    Ok(ApiResponse::ok(feedback.into_iter().map(Into::into).collect()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/students", get(list).post(create))
        .route("/students/{id}", get(show).put(update).delete(delete))
        .route("/students/{id}/matches", get(matches))
        .route(
            "/students/{id}/recommendations",
            get(list_recommendations).post(save_top_match),
        )
        .route("/students/{id}/feedback", get(list_feedback))
}
