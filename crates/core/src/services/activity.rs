//! Activity catalog service.

use edumatch_common::{AppError, AppResult, IdGenerator, JsonCache};
use edumatch_db::{
    entities::activity::{self, Difficulty},
    repositories::{ActivityRepository, FeedbackRepository, RecommendationRepository},
};
use serde::Deserialize;
use tracing::{info, warn};
use validator::Validate;

use crate::access::Actor;
use crate::scoring::CatalogEntry;
use crate::tags::TagSet;

/// Cache key for the full catalog listing.
const CATALOG_CACHE_KEY: &str = "activities";

/// Input for creating an activity.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateActivityInput {
    /// Display title.
    #[validate(length(min = 1, max = 256))]
    pub title: String,

    /// Optional longer text.
    #[validate(length(max = 5000))]
    pub description: Option<String>,

    /// Defaults to easy.
    pub difficulty: Option<Difficulty>,

    /// A list of tags or one comma-separated string.
    #[serde(default)]
    pub tags: TagSet,
}

/// Input for updating an activity. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateActivityInput {
    /// Display title.
    #[validate(length(min = 1, max = 256))]
    pub title: Option<String>,

    /// A blank description clears it.
    #[validate(length(max = 5000))]
    pub description: Option<String>,

    /// Activity difficulty.
    pub difficulty: Option<Difficulty>,

    /// Replacement tags, refused once the activity is recommended.
    pub tags: Option<TagSet>,
}

/// The activity catalog.
#[derive(Clone)]
pub struct ActivityService {
    activity_repo: ActivityRepository,
    recommendation_repo: RecommendationRepository,
    feedback_repo: FeedbackRepository,
    cache: Option<JsonCache>,
    id_gen: IdGenerator,
}

impl ActivityService {
    /// Create a new activity service.
    #[must_use]
    pub const fn new(
        activity_repo: ActivityRepository,
        recommendation_repo: RecommendationRepository,
        feedback_repo: FeedbackRepository,
    ) -> Self {
        Self {
            activity_repo,
            recommendation_repo,
            feedback_repo,
            cache: None,
            id_gen: IdGenerator::new(),
        }
    }

    /// Serve catalog listings through a Redis cache.
    #[must_use]
    pub fn with_cache(mut self, cache: JsonCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// The full catalog in catalog order.
    pub async fn list(&self) -> AppResult<Vec<activity::Model>> {
        if let Some(cache) = &self.cache {
            match cache.get::<Vec<activity::Model>>(CATALOG_CACHE_KEY).await {
                Ok(Some(activities)) => return Ok(activities),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Catalog cache read failed"),
            }
        }

        let activities = self.activity_repo.find_all().await?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.set(CATALOG_CACHE_KEY, &activities).await {
                warn!(error = %e, "Catalog cache write failed");
            }
        }

        Ok(activities)
    }

    /// The catalog as scoring input.
    pub async fn catalog(&self) -> AppResult<(Vec<activity::Model>, Vec<CatalogEntry>)> {
        let activities = self.list().await?;
        let entries = activities.iter().map(CatalogEntry::from).collect();
        Ok((activities, entries))
    }

    /// Get an activity by ID.
    pub async fn get(&self, id: &str) -> AppResult<activity::Model> {
        self.activity_repo.get_by_id(id).await
    }

    /// Add an activity to the catalog.
    pub async fn create(
        &self,
        actor: &Actor,
        input: CreateActivityInput,
    ) -> AppResult<activity::Model> {
        actor.require_staff()?;
        input.validate()?;

        let activity = self
            .activity_repo
            .create(
                self.id_gen.generate(),
                input.title.trim().to_string(),
                normalize_description(input.description),
                input.difficulty.unwrap_or_default(),
                input.tags.to_json(),
                Some(actor.user_id().to_string()),
            )
            .await?;

        self.invalidate().await;
        info!(actor = %actor, activity_id = %activity.id, tags = %input.tags, "Activity created");

        Ok(activity)
    }

    /// Update an activity.
    ///
    /// Tags cannot change once a recommendation references the activity.
    pub async fn update(
        &self,
        actor: &Actor,
        id: &str,
        input: UpdateActivityInput,
    ) -> AppResult<activity::Model> {
        actor.require_staff()?;
        input.validate()?;

        let current = self.activity_repo.get_by_id(id).await?;

        let tags = match input.tags {
            Some(tags) if tags != TagSet::from_json(&current.tags) => {
                if self.recommendation_repo.count_by_activity(id).await? > 0 {
                    return Err(AppError::Conflict(
                        "Tags cannot change while recommendations reference this activity"
                            .to_string(),
                    ));
                }
                Some(tags.to_json())
            }
            _ => None,
        };

        let activity = self
            .activity_repo
            .update(
                id,
                input.title.map(|t| t.trim().to_string()),
                input.description.map(|d| normalize_description(Some(d))),
                input.difficulty,
                tags,
            )
            .await?;

        self.invalidate().await;
        info!(actor = %actor, activity_id = %id, "Activity updated");

        Ok(activity)
    }

    /// Delete an activity (admin only).
    ///
    /// Refused while recommendations or feedback reference it.
    pub async fn delete(&self, actor: &Actor, id: &str) -> AppResult<()> {
        actor.require_admin()?;

        self.activity_repo.get_by_id(id).await?;

        if self.recommendation_repo.count_by_activity(id).await? > 0
            || self.feedback_repo.count_by_activity(id).await? > 0
        {
            return Err(AppError::Conflict(
                "Activity is referenced by recommendations or feedback".to_string(),
            ));
        }

        self.activity_repo.delete(id).await?;

        self.invalidate().await;
        info!(actor = %actor, activity_id = %id, "Activity deleted");

        Ok(())
    }

    async fn invalidate(&self) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.invalidate(CATALOG_CACHE_KEY).await {
                warn!(error = %e, "Catalog cache invalidation failed");
            }
        }
    }
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use serde_json::json;
    use std::sync::Arc;

    fn teacher() -> Actor {
        Actor::Teacher {
            user_id: "tu".to_string(),
            teacher_id: Some("t1".to_string()),
        }
    }

    fn admin() -> Actor {
        Actor::Admin {
            user_id: "root".to_string(),
        }
    }

    fn create_test_activity(id: &str, tags: serde_json::Value) -> activity::Model {
        activity::Model {
            id: id.to_string(),
            title: "Picture cards".to_string(),
            description: None,
            difficulty: Difficulty::Easy,
            tags,
            created_by: Some("tu".to_string()),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn count_row(n: i64) -> [std::collections::BTreeMap<&'static str, sea_orm::Value>; 1] {
        [maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(n)) }]
    }

    fn service(
        activity_db: MockDatabase,
        recommendation_db: MockDatabase,
        feedback_db: MockDatabase,
    ) -> ActivityService {
        ActivityService::new(
            ActivityRepository::new(Arc::new(activity_db.into_connection())),
            RecommendationRepository::new(Arc::new(recommendation_db.into_connection())),
            FeedbackRepository::new(Arc::new(feedback_db.into_connection())),
        )
    }

    #[tokio::test]
    async fn test_student_cannot_create() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
        );
        let student = Actor::Student {
            user_id: "su".to_string(),
            student_id: Some("s1".to_string()),
        };

        let result = service
            .create(
                &student,
                CreateActivityInput {
                    title: "Flashcards".to_string(),
                    description: None,
                    difficulty: None,
                    tags: TagSet::parse("visual"),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_create_normalizes_tags() {
        let created = create_test_activity("a1", json!(["dyslexia", "visual"]));

        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[created]]),
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let input: CreateActivityInput = serde_json::from_value(json!({
            "title": "Picture cards",
            "tags": "Visual, DYSLEXIA"
        }))
        .unwrap();
        assert_eq!(input.tags.to_json(), json!(["dyslexia", "visual"]));

        let activity = service.create(&teacher(), input).await.unwrap();
        assert_eq!(activity.id, "a1");
    }

    #[tokio::test]
    async fn test_tag_change_with_recommendations_conflicts() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_activity("a1", json!(["visual"]))]]),
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([count_row(1)]),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let result = service
            .update(
                &teacher(),
                "a1",
                UpdateActivityInput {
                    tags: Some(TagSet::parse("auditory")),
                    ..UpdateActivityInput::default()
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_same_tags_skip_reference_check() {
        let current = create_test_activity("a1", json!(["visual"]));
        let renamed = activity::Model {
            title: "Picture cards II".to_string(),
            ..current.clone()
        };

        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[current.clone()]])
                .append_query_results([[current]])
                .append_query_results([[renamed]]),
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let result = service
            .update(
                &teacher(),
                "a1",
                UpdateActivityInput {
                    title: Some("Picture cards II".to_string()),
                    tags: Some(TagSet::parse("VISUAL")),
                    ..UpdateActivityInput::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(result.title, "Picture cards II");
    }

    #[tokio::test]
    async fn test_delete_requires_admin() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let result = service.delete(&teacher(), "a1").await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_delete_unreferenced() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_activity("a1", json!([]))]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }]),
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([count_row(0)]),
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([count_row(0)]),
        );

        assert!(service.delete(&admin(), "a1").await.is_ok());
    }
}
