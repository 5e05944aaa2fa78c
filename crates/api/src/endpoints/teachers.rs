//! Teacher endpoints (admin only).

use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
    Json, Router,
};
use edumatch_common::AppResult;
use edumatch_core::{CreateTeacherInput, UpdateTeacherInput};
use edumatch_db::entities::{teacher, user};
use serde::Serialize;

use super::auth::UserResponse;
use crate::{
    extractors::CurrentActor,
    middleware::AppState,
    response::{ack, Ack, ApiResponse},
};

/// Teacher response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherResponse {
    pub id: String,
    pub user_id: String,
    pub subject: Option<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
}

impl TeacherResponse {
    pub fn new(t: teacher::Model, user: Option<user::Model>) -> Self {
        Self {
            id: t.id,
            user_id: t.user_id,
            subject: t.subject,
            created_at: t.created_at.to_rfc3339(),
            user: user.map(Into::into),
        }
    }
}

async fn list(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<TeacherResponse>>> {
    let teachers = state.teacher_service.list(&actor).await?;

    Ok(ApiResponse::ok(
        teachers
            .into_iter()
            .map(|(t, u)| TeacherResponse::new(t, u))
            .collect(),
    ))
}

async fn create(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Json(req): Json<CreateTeacherInput>,
) -> AppResult<Response> {
    let (teacher, user) = state.teacher_service.create(&actor, req).await?;
    Ok(ApiResponse::created(TeacherResponse::new(teacher, Some(user))))
}

async fn show(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<TeacherResponse>> {
    let (teacher, user) = state.teacher_service.get(&actor, &id).await?;
    Ok(ApiResponse::ok(TeacherResponse::new(teacher, user)))
}

async fn update(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateTeacherInput>,
) -> AppResult<ApiResponse<TeacherResponse>> {
    let teacher = state.teacher_service.update(&actor, &id, req).await?;
    Ok(ApiResponse::ok(TeacherResponse::new(teacher, None)))
}

async fn delete(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Ack>> {
    state.teacher_service.delete(&actor, &id).await?;
    Ok(ack())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/teachers", get(list).post(create))
        .route("/teachers/{id}", get(show).put(update).delete(delete))
}
