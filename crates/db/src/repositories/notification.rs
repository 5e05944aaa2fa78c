//! Notification repository.

use std::sync::Arc;

use chrono::Utc;
use edumatch_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter,
    QueryOrder, Set,
};

use crate::entities::{notification, Notification};

/// Repository for notification operations.
#[derive(Clone)]
pub struct NotificationRepository {
    db: Arc<DatabaseConnection>,
}

impl NotificationRepository {
    /// Create a new notification repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a notification.
    pub async fn create(
        &self,
        id: String,
        recipient_id: String,
        message: String,
    ) -> AppResult<notification::Model> {
        let active_model = notification::ActiveModel {
            id: Set(id),
            recipient_id: Set(recipient_id),
            message: Set(message),
            is_read: Set(false),
            created_at: Set(Utc::now().into()),
        };

        active_model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Notifications for a user, newest first.
    pub async fn find_by_recipient(
        &self,
        recipient_id: &str,
    ) -> AppResult<Vec<notification::Model>> {
        Notification::find()
            .filter(notification::Column::RecipientId.eq(recipient_id))
            .order_by(notification::Column::CreatedAt, Order::Desc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark one of the user's notifications as read.
    pub async fn mark_as_read(
        &self,
        id: &str,
        recipient_id: &str,
    ) -> AppResult<notification::Model> {
        let notification = Notification::find_by_id(id)
            .filter(notification::Column::RecipientId.eq(recipient_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("Notification not found: {id}")))?;

        if notification.is_read {
            return Ok(notification);
        }

        let mut active: notification::ActiveModel = notification.into();
        active.is_read = Set(true);

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_notification(id: &str, is_read: bool) -> notification::Model {
        notification::Model {
            id: id.to_string(),
            recipient_id: "u1".to_string(),
            message: "New student \"sam\" added".to_string(),
            is_read,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_mark_as_read() {
        let unread = create_test_notification("n1", false);
        let read = create_test_notification("n1", true);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[unread]])
                .append_query_results([[read]])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        let result = repo.mark_as_read("n1", "u1").await.unwrap();

        assert!(result.is_read);
    }

    #[tokio::test]
    async fn test_mark_as_read_other_recipient() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<notification::Model>::new()])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        let result = repo.mark_as_read("n1", "someone-else").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
