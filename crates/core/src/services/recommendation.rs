//! Recommendation service.
//!
//! Live matches are ranked on demand and never stored. A match becomes a
//! persisted recommendation only through [`RecommendationService::save_top_match`]
//! or a manual [`RecommendationService::create`], both of which rely on the
//! unique (student, activity) index so that concurrent saves of the same
//! pair produce exactly one row.

use edumatch_common::{AppError, AppResult, IdGenerator};
use edumatch_db::{
    entities::{activity, recommendation},
    repositories::{FeedbackRepository, RecommendationRepository},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::activity::ActivityService;
use crate::access::{Access, Actor, OwnershipGuard};
use crate::scoring::{rank, ActivityMatch, LearnerProfile};

/// Input for a manually entered recommendation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecommendationInput {
    /// Student id.
    pub student_id: String,
    /// Activity id.
    pub activity_id: String,
    /// Must be finite and non-negative.
    pub score: f64,
}

/// Result of promoting the top match.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SaveTopMatchOutcome {
    /// A new recommendation was stored.
    Created {
        /// The stored row.
        recommendation: recommendation::Model,
        /// The matched activity.
        activity: activity::Model,
    },
    /// No activity in the catalog matched the student.
    NoMatch,
}

/// Scored matches and persisted recommendations.
#[derive(Clone)]
pub struct RecommendationService {
    recommendation_repo: RecommendationRepository,
    feedback_repo: FeedbackRepository,
    activity_service: ActivityService,
    guard: OwnershipGuard,
    id_gen: IdGenerator,
}

impl RecommendationService {
    /// Create a new recommendation service.
    #[must_use]
    pub const fn new(
        recommendation_repo: RecommendationRepository,
        feedback_repo: FeedbackRepository,
        activity_service: ActivityService,
        guard: OwnershipGuard,
    ) -> Self {
        Self {
            recommendation_repo,
            feedback_repo,
            activity_service,
            guard,
            id_gen: IdGenerator::new(),
        }
    }

    /// Rank the live catalog for a student.
    pub async fn list_matches(
        &self,
        actor: &Actor,
        student_id: &str,
    ) -> AppResult<Vec<ActivityMatch>> {
        let student = self
            .guard
            .authorize_student(actor, student_id, Access::View)
            .await?;
        let (_, catalog) = self.activity_service.catalog().await?;

        Ok(rank(&LearnerProfile::from(&student), &catalog))
    }

    /// Persist the student's highest-scored match.
    ///
    /// Fails with `Conflict` when that (student, activity) pair is already
    /// recommended; nothing is written in that case.
    pub async fn save_top_match(
        &self,
        actor: &Actor,
        student_id: &str,
    ) -> AppResult<SaveTopMatchOutcome> {
        let result = self.try_save_top_match(actor, student_id).await;

        if let Err(e) = &result {
            if e.is_server_error() {
                error!(actor = %actor, student_id = %student_id, error = %e, "Failed to save top match");
            }
        }

        result
    }

    async fn try_save_top_match(
        &self,
        actor: &Actor,
        student_id: &str,
    ) -> AppResult<SaveTopMatchOutcome> {
        let student = self
            .guard
            .authorize_student(actor, student_id, Access::Manage)
            .await?;
        let (activities, catalog) = self.activity_service.catalog().await?;

        let Some(top) = rank(&LearnerProfile::from(&student), &catalog)
            .into_iter()
            .next()
        else {
            info!(actor = %actor, student_id = %student_id, "No matching activity");
            return Ok(SaveTopMatchOutcome::NoMatch);
        };

        let activity = activities
            .into_iter()
            .find(|a| a.id == top.activity_id)
            .ok_or_else(|| {
                AppError::Internal(format!("Ranked activity missing: {}", top.activity_id))
            })?;

        let recommendation = self
            .recommendation_repo
            .insert_if_absent(
                self.id_gen.generate(),
                student.id,
                top.activity_id,
                top.score,
            )
            .await?
            .ok_or_else(|| AppError::Conflict("Activity already recommended".to_string()))?;

        info!(
            actor = %actor,
            student_id = %student_id,
            activity_id = %activity.id,
            score = recommendation.score,
            "Top match saved"
        );

        Ok(SaveTopMatchOutcome::Created {
            recommendation,
            activity,
        })
    }

    /// Manually recommend an activity.
    pub async fn create(
        &self,
        actor: &Actor,
        input: CreateRecommendationInput,
    ) -> AppResult<recommendation::Model> {
        validate_score(input.score)?;

        let student = self
            .guard
            .authorize_student(actor, &input.student_id, Access::Manage)
            .await?;
        let activity = self.activity_service.get(&input.activity_id).await?;

        let recommendation = self
            .recommendation_repo
            .insert_if_absent(self.id_gen.generate(), student.id, activity.id, input.score)
            .await?
            .ok_or_else(|| AppError::Conflict("Activity already recommended".to_string()))?;

        info!(actor = %actor, recommendation_id = %recommendation.id, "Recommendation created");
        Ok(recommendation)
    }

    /// A student's persisted recommendations, newest first.
    pub async fn list_for_student(
        &self,
        actor: &Actor,
        student_id: &str,
    ) -> AppResult<Vec<recommendation::Model>> {
        self.guard
            .authorize_student(actor, student_id, Access::View)
            .await?;
        self.recommendation_repo.find_by_student(student_id).await
    }

    /// Every recommendation (admin only).
    pub async fn list_all(&self, actor: &Actor) -> AppResult<Vec<recommendation::Model>> {
        actor.require_admin()?;
        self.recommendation_repo.find_all().await
    }

    /// Get a recommendation the actor may view.
    pub async fn get(&self, actor: &Actor, id: &str) -> AppResult<recommendation::Model> {
        let recommendation = self.recommendation_repo.get_by_id(id).await?;
        self.guard
            .authorize_student(actor, &recommendation.student_id, Access::View)
            .await?;

        Ok(recommendation)
    }

    /// Overwrite a recommendation's score (admin only).
    pub async fn update_score(
        &self,
        actor: &Actor,
        id: &str,
        score: f64,
    ) -> AppResult<recommendation::Model> {
        actor.require_admin()?;
        validate_score(score)?;

        self.recommendation_repo.update_score(id, score).await
    }

    /// Delete a recommendation (admin only).
    ///
    /// Refused while feedback references it.
    pub async fn delete(&self, actor: &Actor, id: &str) -> AppResult<()> {
        actor.require_admin()?;

        self.recommendation_repo.get_by_id(id).await?;

        if self.feedback_repo.count_by_recommendation(id).await? > 0 {
            return Err(AppError::Conflict(
                "Recommendation has feedback".to_string(),
            ));
        }

        self.recommendation_repo.delete(id).await?;

        info!(actor = %actor, recommendation_id = %id, "Recommendation deleted");
        Ok(())
    }
}

fn validate_score(score: f64) -> AppResult<()> {
    if score.is_finite() && score >= 0.0 {
        Ok(())
    } else {
        Err(AppError::Validation(
            "score must be a finite, non-negative number".to_string(),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use edumatch_db::{
        entities::{activity::Difficulty, student},
        repositories::{ActivityRepository, StudentRepository, TeacherRepository},
    };
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use serde_json::json;
    use std::sync::Arc;

    struct Mocks {
        student: MockDatabase,
        activity: MockDatabase,
        recommendation: MockDatabase,
        feedback: MockDatabase,
    }

    impl Default for Mocks {
        fn default() -> Self {
            Self {
                student: MockDatabase::new(DatabaseBackend::Postgres),
                activity: MockDatabase::new(DatabaseBackend::Postgres),
                recommendation: MockDatabase::new(DatabaseBackend::Postgres),
                feedback: MockDatabase::new(DatabaseBackend::Postgres),
            }
        }
    }

    impl Mocks {
        fn into_service(self) -> RecommendationService {
            let recommendation_repo =
                RecommendationRepository::new(Arc::new(self.recommendation.into_connection()));
            let feedback_repo = FeedbackRepository::new(Arc::new(self.feedback.into_connection()));

            RecommendationService::new(
                recommendation_repo.clone(),
                feedback_repo.clone(),
                ActivityService::new(
                    ActivityRepository::new(Arc::new(self.activity.into_connection())),
                    recommendation_repo,
                    feedback_repo,
                ),
                OwnershipGuard::new(
                    StudentRepository::new(Arc::new(self.student.into_connection())),
                    TeacherRepository::new(Arc::new(
                        MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
                    )),
                ),
            )
        }
    }

    fn teacher(teacher_id: &str) -> Actor {
        Actor::Teacher {
            user_id: format!("user-{teacher_id}"),
            teacher_id: Some(teacher_id.to_string()),
        }
    }

    fn create_test_student(disability: Option<&str>, learning_style: Option<&str>) -> student::Model {
        student::Model {
            id: "s1".to_string(),
            user_id: "user-s1".to_string(),
            teacher_id: "t1".to_string(),
            disability: disability.map(str::to_string),
            learning_style: learning_style.map(str::to_string),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_activity(id: &str, tags: serde_json::Value) -> activity::Model {
        activity::Model {
            id: id.to_string(),
            title: format!("Activity {id}"),
            description: None,
            difficulty: Difficulty::Easy,
            tags,
            created_by: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn catalog() -> Vec<activity::Model> {
        vec![
            create_test_activity("a1", json!(["visual"])),
            create_test_activity("a2", json!(["visual", "dyslexia"])),
            create_test_activity("a3", json!(["auditory"])),
        ]
    }

    fn inserted(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    #[tokio::test]
    async fn test_list_matches_ranks_catalog() {
        let service = Mocks {
            student: MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_student(Some("dyslexia"), Some("visual"))]]),
            activity: MockDatabase::new(DatabaseBackend::Postgres).append_query_results([catalog()]),
            ..Mocks::default()
        }
        .into_service();

        let matches = service.list_matches(&teacher("t1"), "s1").await.unwrap();

        let ids: Vec<&str> = matches.iter().map(|m| m.activity_id.as_str()).collect();
        assert_eq!(ids, ["a2", "a1"]);
        assert!((matches[0].score - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_save_top_match_creates() {
        let service = Mocks {
            student: MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_student(Some("dyslexia"), Some("visual"))]]),
            activity: MockDatabase::new(DatabaseBackend::Postgres).append_query_results([catalog()]),
            recommendation: MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([inserted(1)]),
            ..Mocks::default()
        }
        .into_service();

        let outcome = service.save_top_match(&teacher("t1"), "s1").await.unwrap();

        match outcome {
            SaveTopMatchOutcome::Created {
                recommendation,
                activity,
            } => {
                assert_eq!(recommendation.student_id, "s1");
                assert_eq!(recommendation.activity_id, "a2");
                assert!((recommendation.score - 1.0).abs() < f64::EPSILON);
                assert_eq!(activity.id, "a2");
            }
            SaveTopMatchOutcome::NoMatch => panic!("expected a saved recommendation"),
        }
    }

    #[tokio::test]
    async fn test_save_top_match_twice_conflicts() {
        let student = create_test_student(Some("Dyslexia"), Some("visual"));
        let mixed_catalog = vec![
            create_test_activity("a1", json!("Visual")),
            create_test_activity("a2", json!(["visual", "dyslexia"])),
            create_test_activity("a3", serde_json::Value::Null),
        ];

        let service = Mocks {
            student: MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[student.clone()]])
                .append_query_results([[student]]),
            activity: MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([mixed_catalog.clone()])
                .append_query_results([mixed_catalog]),
            recommendation: MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([inserted(1), inserted(0)]),
            ..Mocks::default()
        }
        .into_service();

        let first = service.save_top_match(&teacher("t1"), "s1").await.unwrap();
        match first {
            SaveTopMatchOutcome::Created {
                recommendation,
                activity,
            } => {
                assert_eq!(activity.id, "a2");
                assert!((recommendation.score - 1.0).abs() < f64::EPSILON);
            }
            SaveTopMatchOutcome::NoMatch => panic!("expected a saved recommendation"),
        }

        let second = service.save_top_match(&teacher("t1"), "s1").await;
        assert!(matches!(second, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_save_top_match_without_match() {
        let service = Mocks {
            student: MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_student(None, Some("kinesthetic"))]]),
            activity: MockDatabase::new(DatabaseBackend::Postgres).append_query_results([catalog()]),
            ..Mocks::default()
        }
        .into_service();

        let outcome = service.save_top_match(&teacher("t1"), "s1").await.unwrap();
        assert!(matches!(outcome, SaveTopMatchOutcome::NoMatch));
    }

    #[tokio::test]
    async fn test_save_top_match_other_teacher_forbidden() {
        let service = Mocks {
            student: MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_student(Some("dyslexia"), None)]]),
            ..Mocks::default()
        }
        .into_service();

        let result = service.save_top_match(&teacher("t9"), "s1").await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_manual_create_rejects_negative_score() {
        let service = Mocks::default().into_service();

        let result = service
            .create(
                &teacher("t1"),
                CreateRecommendationInput {
                    student_id: "s1".to_string(),
                    activity_id: "a1".to_string(),
                    score: -0.5,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_validate_score() {
        assert!(validate_score(0.0).is_ok());
        assert!(validate_score(1.5).is_ok());
        assert!(validate_score(f64::NAN).is_err());
        assert!(validate_score(f64::INFINITY).is_err());
    }
}
