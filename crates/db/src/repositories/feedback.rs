//! Feedback repository.

use std::sync::Arc;

use chrono::Utc;
use edumatch_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

use crate::entities::{feedback, Feedback};

/// Repository for feedback operations.
#[derive(Clone)]
pub struct FeedbackRepository {
    db: Arc<DatabaseConnection>,
}

impl FeedbackRepository {
    /// Create a new feedback repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find feedback by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<feedback::Model>> {
        Feedback::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find feedback by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<feedback::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Feedback not found: {id}")))
    }

    /// Feedback on a recommendation, newest first.
    pub async fn find_by_recommendation(
        &self,
        recommendation_id: &str,
    ) -> AppResult<Vec<feedback::Model>> {
        Feedback::find()
            .filter(feedback::Column::RecommendationId.eq(recommendation_id))
            .order_by(feedback::Column::CreatedAt, Order::Desc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Feedback about a student, newest first.
    pub async fn find_by_student(&self, student_id: &str) -> AppResult<Vec<feedback::Model>> {
        Feedback::find()
            .filter(feedback::Column::StudentId.eq(student_id))
            .order_by(feedback::Column::CreatedAt, Order::Desc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All feedback for an activity.
    pub async fn find_by_activity(&self, activity_id: &str) -> AppResult<Vec<feedback::Model>> {
        Feedback::find()
            .filter(feedback::Column::ActivityId.eq(activity_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count feedback about a student.
    pub async fn count_by_student(&self, student_id: &str) -> AppResult<u64> {
        Feedback::find()
            .filter(feedback::Column::StudentId.eq(student_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count feedback for an activity.
    pub async fn count_by_activity(&self, activity_id: &str) -> AppResult<u64> {
        Feedback::find()
            .filter(feedback::Column::ActivityId.eq(activity_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count feedback on a recommendation.
    pub async fn count_by_recommendation(&self, recommendation_id: &str) -> AppResult<u64> {
        Feedback::find()
            .filter(feedback::Column::RecommendationId.eq(recommendation_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create feedback.
    pub async fn create(&self, model: feedback::ActiveModel) -> AppResult<feedback::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Partially update feedback. `None` leaves a field unchanged.
    pub async fn update(
        &self,
        id: &str,
        rating: Option<i32>,
        helpful: Option<Option<bool>>,
        comment: Option<Option<String>>,
    ) -> AppResult<feedback::Model> {
        let feedback = self.get_by_id(id).await?;

        let mut active: feedback::ActiveModel = feedback.into();

        if let Some(rating) = rating {
            active.rating = Set(rating);
        }
        if let Some(helpful) = helpful {
            active.helpful = Set(helpful);
        }
        if let Some(comment) = comment {
            active.comment = Set(comment);
        }

        active.updated_at = Set(Some(Utc::now().into()));

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete feedback.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Feedback::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}
