//! Feedback on recommendations and per-activity aggregation.

use chrono::Utc;
use edumatch_common::{AppResult, IdGenerator};
use edumatch_db::{
    entities::feedback,
    repositories::{FeedbackRepository, RecommendationRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::info;
use validator::Validate;

use crate::access::{Access, Actor, OwnershipGuard};

/// Input for leaving feedback on a recommendation.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateFeedbackInput {
    /// Rating from 1 to 5.
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,

    /// Anything other than a JSON boolean is treated as unset.
    #[serde(default, deserialize_with = "lenient_bool")]
    pub helpful: Option<bool>,

    /// Free-text comment.
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

/// Input for editing feedback. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateFeedbackInput {
    /// New rating from 1 to 5.
    #[validate(range(min = 1, max = 5))]
    pub rating: Option<i32>,

    /// `null` or a non-boolean clears the flag.
    #[serde(default, deserialize_with = "lenient_bool_patch")]
    pub helpful: Option<Option<bool>>,

    /// A blank comment clears it.
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

/// Aggregate feedback for one activity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSummary {
    /// Number of feedback rows.
    pub count: u64,
    /// Mean rating to two decimals; `None` without feedback.
    pub avg_rating: Option<f64>,
    /// Rows marked helpful.
    pub helpful_count: u64,
}

/// Summarize a set of feedback rows.
#[must_use]
pub fn summarize(rows: &[feedback::Model]) -> FeedbackSummary {
    let count = rows.len() as u64;
    let helpful_count = rows.iter().filter(|f| f.helpful == Some(true)).count() as u64;

    let avg_rating = (count > 0).then(|| {
        let total: i64 = rows.iter().map(|f| i64::from(f.rating)).sum();
        let mean = total as f64 / count as f64;
        (mean * 100.0).round() / 100.0
    });

    FeedbackSummary {
        count,
        avg_rating,
        helpful_count,
    }
}

/// Feedback service.
#[derive(Clone)]
pub struct FeedbackService {
    feedback_repo: FeedbackRepository,
    recommendation_repo: RecommendationRepository,
    guard: OwnershipGuard,
    id_gen: IdGenerator,
}

impl FeedbackService {
    /// Create a new feedback service.
    #[must_use]
    pub const fn new(
        feedback_repo: FeedbackRepository,
        recommendation_repo: RecommendationRepository,
        guard: OwnershipGuard,
    ) -> Self {
        Self {
            feedback_repo,
            recommendation_repo,
            guard,
            id_gen: IdGenerator::new(),
        }
    }

    /// Leave feedback on a recommendation.
    pub async fn create(
        &self,
        actor: &Actor,
        recommendation_id: &str,
        input: CreateFeedbackInput,
    ) -> AppResult<feedback::Model> {
        let recommendation = self.recommendation_repo.get_by_id(recommendation_id).await?;
        self.guard
            .authorize_student(actor, &recommendation.student_id, Access::View)
            .await?;
        input.validate()?;

        let model = feedback::ActiveModel {
            id: Set(self.id_gen.generate()),
            recommendation_id: Set(recommendation.id),
            student_id: Set(recommendation.student_id),
            activity_id: Set(recommendation.activity_id),
            rating: Set(input.rating),
            helpful: Set(input.helpful),
            comment: Set(normalize_comment(input.comment)),
            created_by: Set(actor.role()),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let feedback = self.feedback_repo.create(model).await?;

        info!(
            actor = %actor,
            feedback_id = %feedback.id,
            activity_id = %feedback.activity_id,
            rating = feedback.rating,
            "Feedback created"
        );

        Ok(feedback)
    }

    /// Feedback on one recommendation, newest first.
    pub async fn list_for_recommendation(
        &self,
        actor: &Actor,
        recommendation_id: &str,
    ) -> AppResult<Vec<feedback::Model>> {
        let recommendation = self.recommendation_repo.get_by_id(recommendation_id).await?;
        self.guard
            .authorize_student(actor, &recommendation.student_id, Access::View)
            .await?;

        self.feedback_repo
            .find_by_recommendation(recommendation_id)
            .await
    }

    /// Feedback about one student, newest first.
    pub async fn list_for_student(
        &self,
        actor: &Actor,
        student_id: &str,
    ) -> AppResult<Vec<feedback::Model>> {
        self.guard
            .authorize_student(actor, student_id, Access::View)
            .await?;
        self.feedback_repo.find_by_student(student_id).await
    }

    /// Aggregate feedback for an activity (teachers and admins).
    ///
    /// An unknown activity summarizes to zero feedback.
    pub async fn summarize_activity(
        &self,
        actor: &Actor,
        activity_id: &str,
    ) -> AppResult<FeedbackSummary> {
        actor.require_staff()?;

        let rows = self.feedback_repo.find_by_activity(activity_id).await?;
        Ok(summarize(&rows))
    }

    /// Edit feedback.
    pub async fn update(
        &self,
        actor: &Actor,
        id: &str,
        input: UpdateFeedbackInput,
    ) -> AppResult<feedback::Model> {
        let feedback = self.feedback_repo.get_by_id(id).await?;
        self.guard
            .authorize_student(actor, &feedback.student_id, Access::View)
            .await?;
        input.validate()?;

        self.feedback_repo
            .update(
                id,
                input.rating,
                input.helpful,
                input.comment.map(|c| normalize_comment(Some(c))),
            )
            .await
    }

    /// Delete feedback (admin only).
    pub async fn delete(&self, actor: &Actor, id: &str) -> AppResult<()> {
        actor.require_admin()?;

        self.feedback_repo.get_by_id(id).await?;
        self.feedback_repo.delete(id).await?;

        info!(actor = %actor, feedback_id = %id, "Feedback deleted");
        Ok(())
    }
}

fn normalize_comment(comment: Option<String>) -> Option<String> {
    comment
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => Some(b),
        _ => None,
    })
}

fn lenient_bool_patch<'de, D>(deserializer: D) -> Result<Option<Option<bool>>, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_bool(deserializer).map(Some)
}
