//! Teacher repository.

use std::sync::Arc;

use chrono::Utc;
use edumatch_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use crate::entities::{teacher, user, Teacher, User};

/// Repository for teacher profile operations.
#[derive(Clone)]
pub struct TeacherRepository {
    db: Arc<DatabaseConnection>,
}

impl TeacherRepository {
    /// Create a new teacher repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find teacher by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<teacher::Model>> {
        Teacher::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the teacher profile linked to a user.
    pub async fn find_by_user_id(&self, user_id: &str) -> AppResult<Option<teacher::Model>> {
        Teacher::find()
            .filter(teacher::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List all teachers with their accounts, oldest first.
    pub async fn find_all_with_user(
        &self,
    ) -> AppResult<Vec<(teacher::Model, Option<user::Model>)>> {
        Teacher::find()
            .find_also_related(User)
            .order_by(teacher::Column::CreatedAt, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a user and its teacher profile in one transaction.
    pub async fn create_with_user(
        &self,
        user: user::ActiveModel,
        profile: teacher::ActiveModel,
    ) -> AppResult<(user::Model, teacher::Model)> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let user = user
            .insert(&txn)
            .await
            .map_err(|e| super::map_insert_err(e, "User"))?;
        let profile = profile
            .insert(&txn)
            .await
            .map_err(|e| super::map_insert_err(e, "Teacher"))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((user, profile))
    }

    /// Update the subject.
    pub async fn update_subject(
        &self,
        id: &str,
        subject: Option<String>,
    ) -> AppResult<teacher::Model> {
        let teacher = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Teacher not found: {id}")))?;

        let mut active: teacher::ActiveModel = teacher.into();
        active.subject = Set(subject);

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a teacher profile and its user in one transaction.
    pub async fn delete_with_user(&self, teacher: &teacher::Model) -> AppResult<()> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Teacher::delete_by_id(&teacher.id)
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        User::delete_by_id(&teacher.user_id)
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Stamp for new profiles.
    #[must_use]
    pub fn new_profile(id: String, user_id: String, subject: Option<String>) -> teacher::ActiveModel {
        teacher::ActiveModel {
            id: Set(id),
            user_id: Set(user_id),
            subject: Set(subject),
            created_at: Set(Utc::now().into()),
        }
    }
}
