//! API middleware.

#![allow(missing_docs)]

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use edumatch_common::AppError;
use edumatch_core::{
    AccountService, ActivityService, FeedbackService, NotificationService, OwnershipGuard,
    RecommendationService, StudentService, TeacherService,
};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub account_service: AccountService,
    pub teacher_service: TeacherService,
    pub student_service: StudentService,
    pub activity_service: ActivityService,
    pub recommendation_service: RecommendationService,
    pub feedback_service: FeedbackService,
    pub notification_service: NotificationService,
    pub guard: OwnershipGuard,
}

/// Authentication middleware.
///
/// A valid bearer token attaches the user and its resolved [`edumatch_core::Actor`]
/// to the request. Requests without one pass through unauthenticated; the
/// extractors reject them where a caller is required.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string);

    if let Some(token) = token {
        match state.account_service.authenticate_by_token(&token).await {
            Ok(user) => match state.guard.resolve_actor(&user).await {
                Ok(actor) => {
                    req.extensions_mut().insert(actor);
                    req.extensions_mut().insert(user);
                }
                Err(e) => return e.into_response(),
            },
            Err(AppError::Unauthorized) => {
                tracing::debug!("Rejected unknown bearer token");
            }
            Err(e) => return e.into_response(),
        }
    }

    next.run(req).await
}
