//! Authentication endpoints.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use edumatch_common::AppResult;
use edumatch_core::SigninInput;
use edumatch_db::entities::user::{self, UserRole};
use serde::Serialize;

use super::{students::StudentResponse, teachers::TeacherResponse};
use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ack, Ack, ApiResponse},
};

/// Public view of an account.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub created_at: String,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            role: u.role,
            created_at: u.created_at.to_rfc3339(),
        }
    }
}

/// Signin response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SigninResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Sign in with email and password.
async fn signin(
    State(state): State<AppState>,
    Json(req): Json<SigninInput>,
) -> AppResult<ApiResponse<SigninResponse>> {
    let user = state.account_service.signin(req).await?;

    Ok(ApiResponse::ok(SigninResponse {
        token: user.token.clone(),
        user: user.into(),
    }))
}

/// Sign out (invalidate current token by rotating it).
async fn signout(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Ack>> {
    state.account_service.signout(&user.id).await?;
    Ok(ack())
}

/// The signed-in user and its role profile.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user: UserResponse,
    pub teacher_profile: Option<TeacherResponse>,
    pub student_profile: Option<StudentResponse>,
}

async fn me(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<MeResponse>> {
    let profile = state.account_service.me(user).await?;

    Ok(ApiResponse::ok(MeResponse {
        user: profile.user.into(),
        teacher_profile: profile
            .teacher_profile
            .map(|t| TeacherResponse::new(t, None)),
        student_profile: profile
            .student_profile
            .map(|s| StudentResponse::new(s, None)),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/signin", post(signin))
        .route("/auth/signout", post(signout))
        .route("/auth/me", get(me))
}
