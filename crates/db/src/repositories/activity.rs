//! Activity repository.

use std::sync::Arc;

use chrono::Utc;
use edumatch_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Order, QueryOrder, Set};
use serde_json::Value as Json;

use crate::entities::{
    activity::{self, Difficulty},
    Activity,
};

/// Repository for the activity catalog.
#[derive(Clone)]
pub struct ActivityRepository {
    db: Arc<DatabaseConnection>,
}

impl ActivityRepository {
    /// Create a new activity repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find activity by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<activity::Model>> {
        Activity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find activity by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<activity::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Activity not found: {id}")))
    }

    /// The whole catalog in catalog order (`created_at`, then `id`).
    pub async fn find_all(&self) -> AppResult<Vec<activity::Model>> {
        Activity::find()
            .order_by(activity::Column::CreatedAt, Order::Asc)
            .order_by(activity::Column::Id, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new activity.
    pub async fn create(
        &self,
        id: String,
        title: String,
        description: Option<String>,
        difficulty: Difficulty,
        tags: Json,
        created_by: Option<String>,
    ) -> AppResult<activity::Model> {
        let active_model = activity::ActiveModel {
            id: Set(id),
            title: Set(title),
            description: Set(description),
            difficulty: Set(difficulty),
            tags: Set(tags),
            created_by: Set(created_by),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        active_model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an activity. `None` leaves a field unchanged.
    pub async fn update(
        &self,
        id: &str,
        title: Option<String>,
        description: Option<Option<String>>,
        difficulty: Option<Difficulty>,
        tags: Option<Json>,
    ) -> AppResult<activity::Model> {
        let activity = self.get_by_id(id).await?;

        let mut active: activity::ActiveModel = activity.into();

        if let Some(title) = title {
            active.title = Set(title);
        }
        if let Some(description) = description {
            active.description = Set(description);
        }
        if let Some(difficulty) = difficulty {
            active.difficulty = Set(difficulty);
        }
        if let Some(tags) = tags {
            active.tags = Set(tags);
        }

        active.updated_at = Set(Some(Utc::now().into()));

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete an activity.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Activity::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}
