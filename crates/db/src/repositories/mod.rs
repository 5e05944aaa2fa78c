//! Repositories, one per table.

mod activity;
mod feedback;
mod notification;
mod recommendation;
mod student;
mod teacher;
mod user;

pub use activity::ActivityRepository;
pub use feedback::FeedbackRepository;
pub use notification::NotificationRepository;
pub use recommendation::RecommendationRepository;
pub use student::StudentRepository;
pub use teacher::TeacherRepository;
pub use user::UserRepository;

use edumatch_common::AppError;
use sea_orm::{DbErr, SqlErr};

/// Map an insert error, turning unique-key violations into `Conflict`.
pub(crate) fn map_insert_err(err: DbErr, what: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict(format!("{what} already exists"))
        }
        _ => AppError::Database(err.to_string()),
    }
}
