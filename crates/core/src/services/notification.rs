//! Notification service.

use edumatch_common::{AppResult, IdGenerator};
use edumatch_db::{entities::notification, repositories::NotificationRepository};
use tracing::debug;

/// In-app notifications.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    id_gen: IdGenerator,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(notification_repo: NotificationRepository) -> Self {
        Self {
            notification_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Send a notification to a user.
    pub async fn notify(
        &self,
        recipient_id: &str,
        message: impl Into<String>,
    ) -> AppResult<notification::Model> {
        let notification = self
            .notification_repo
            .create(self.id_gen.generate(), recipient_id.to_string(), message.into())
            .await?;

        debug!(recipient_id = %recipient_id, notification_id = %notification.id, "Notification created");
        Ok(notification)
    }

    /// A user's notifications, newest first.
    pub async fn list(&self, user_id: &str) -> AppResult<Vec<notification::Model>> {
        self.notification_repo.find_by_recipient(user_id).await
    }

    /// Mark one of the user's notifications as read.
    pub async fn mark_read(&self, user_id: &str, id: &str) -> AppResult<notification::Model> {
        self.notification_repo.mark_as_read(id, user_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use edumatch_common::AppError;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_notify() {
        let created = notification::Model {
            id: "n1".to_string(),
            recipient_id: "u1".to_string(),
            message: "hello".to_string(),
            is_read: false,
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[created]])
                .into_connection(),
        );

        let service = NotificationService::new(NotificationRepository::new(db));
        let result = service.notify("u1", "hello").await.unwrap();

        assert_eq!(result.recipient_id, "u1");
        assert!(!result.is_read);
    }

    #[tokio::test]
    async fn test_mark_read_unknown() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<notification::Model>::new()])
                .into_connection(),
        );

        let service = NotificationService::new(NotificationRepository::new(db));
        let result = service.mark_read("u1", "n404").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
