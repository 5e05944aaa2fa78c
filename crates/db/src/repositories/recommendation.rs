//! Recommendation repository.

use std::sync::Arc;

use chrono::Utc;
use edumatch_common::{AppError, AppResult};
use sea_orm::{
    sea_query::OnConflict, ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    Order, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::{recommendation, Recommendation};

/// Repository for persisted recommendations.
#[derive(Clone)]
pub struct RecommendationRepository {
    db: Arc<DatabaseConnection>,
}

impl RecommendationRepository {
    /// Create a new recommendation repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find recommendation by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<recommendation::Model>> {
        Recommendation::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find recommendation by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<recommendation::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Recommendation not found: {id}")))
    }

    /// A student's recommendations, newest first.
    pub async fn find_by_student(&self, student_id: &str) -> AppResult<Vec<recommendation::Model>> {
        Recommendation::find()
            .filter(recommendation::Column::StudentId.eq(student_id))
            .order_by(recommendation::Column::CreatedAt, Order::Desc)
            .order_by(recommendation::Column::Id, Order::Desc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All recommendations, newest first.
    pub async fn find_all(&self) -> AppResult<Vec<recommendation::Model>> {
        Recommendation::find()
            .order_by(recommendation::Column::CreatedAt, Order::Desc)
            .order_by(recommendation::Column::Id, Order::Desc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count recommendations for a student.
    pub async fn count_by_student(&self, student_id: &str) -> AppResult<u64> {
        Recommendation::find()
            .filter(recommendation::Column::StudentId.eq(student_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count recommendations referencing an activity.
    pub async fn count_by_activity(&self, activity_id: &str) -> AppResult<u64> {
        Recommendation::find()
            .filter(recommendation::Column::ActivityId.eq(activity_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert unless the (student, activity) pair already exists.
    ///
    /// Runs as a single `INSERT ... ON CONFLICT DO NOTHING` against the unique
    /// pair index, so concurrent callers cannot both insert. Returns `None`
    /// when the pair was already present and nothing was written.
    pub async fn insert_if_absent(
        &self,
        id: String,
        student_id: String,
        activity_id: String,
        score: f64,
    ) -> AppResult<Option<recommendation::Model>> {
        let model = recommendation::Model {
            id,
            student_id,
            activity_id,
            score,
            created_at: Utc::now().into(),
            updated_at: None,
        };
        let active_model = recommendation::ActiveModel {
            id: Set(model.id.clone()),
            student_id: Set(model.student_id.clone()),
            activity_id: Set(model.activity_id.clone()),
            score: Set(model.score),
            created_at: Set(model.created_at),
            updated_at: Set(None),
        };

        let result = Recommendation::insert(active_model)
            .on_conflict(
                OnConflict::columns([
                    recommendation::Column::StudentId,
                    recommendation::Column::ActivityId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await;

        match result {
            Ok(0) | Err(DbErr::RecordNotInserted) => Ok(None),
            Ok(_) => Ok(Some(model)),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    /// Set a new score.
    pub async fn update_score(&self, id: &str, score: f64) -> AppResult<recommendation::Model> {
        let recommendation = self.get_by_id(id).await?;

        let mut active: recommendation::ActiveModel = recommendation.into();
        active.score = Set(score);
        active.updated_at = Set(Some(Utc::now().into()));

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a recommendation.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Recommendation::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_recommendation(id: &str, student_id: &str, activity_id: &str) -> recommendation::Model {
        recommendation::Model {
            id: id.to_string(),
            student_id: student_id.to_string(),
            activity_id: activity_id.to_string(),
            score: 1.0,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_insert_if_absent_inserts() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = RecommendationRepository::new(db);
        let result = repo
            .insert_if_absent("r1".to_string(), "s1".to_string(), "a2".to_string(), 1.0)
            .await
            .unwrap();

        let created = result.unwrap();
        assert_eq!(created.student_id, "s1");
        assert_eq!(created.activity_id, "a2");
        assert!((created.score - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_insert_if_absent_skips_existing_pair() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = RecommendationRepository::new(db);
        let result = repo
            .insert_if_absent("r2".to_string(), "s1".to_string(), "a2".to_string(), 1.0)
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_find_by_student() {
        let r2 = create_test_recommendation("r2", "s1", "a1");
        let r1 = create_test_recommendation("r1", "s1", "a2");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[r2, r1]])
                .into_connection(),
        );

        let repo = RecommendationRepository::new(db);
        let result = repo.find_by_student("s1").await.unwrap();

        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|r| r.student_id == "s1"));
    }

    #[tokio::test]
    async fn test_count_by_activity() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(2))
                }]])
                .into_connection(),
        );

        let repo = RecommendationRepository::new(db);
        assert_eq!(repo.count_by_activity("a1").await.unwrap(), 2);
    }
}
