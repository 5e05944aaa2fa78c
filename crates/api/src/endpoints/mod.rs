//! API endpoints.

mod activities;
mod auth;
mod feedback;
mod health;
mod notifications;
mod recommendations;
mod students;
mod teachers;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(teachers::router())
        .merge(students::router())
        .merge(activities::router())
        .merge(recommendations::router())
        .merge(feedback::router())
        .merge(notifications::router())
}
