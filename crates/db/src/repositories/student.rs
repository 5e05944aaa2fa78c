//! Student repository.

use std::sync::Arc;

use chrono::Utc;
use edumatch_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::entities::{student, user, Student, User};

/// Repository for student profile operations.
#[derive(Clone)]
pub struct StudentRepository {
    db: Arc<DatabaseConnection>,
}

impl StudentRepository {
    /// Create a new student repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find student by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<student::Model>> {
        Student::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find student by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<student::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Student not found: {id}")))
    }

    /// Find the student profile linked to a user.
    pub async fn find_by_user_id(&self, user_id: &str) -> AppResult<Option<student::Model>> {
        Student::find()
            .filter(student::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List students with their accounts, oldest first.
    ///
    /// Restricted to one teacher's students when `teacher_id` is given.
    pub async fn find_with_user(
        &self,
        teacher_id: Option<&str>,
    ) -> AppResult<Vec<(student::Model, Option<user::Model>)>> {
        let mut query = Student::find().find_also_related(User);

        if let Some(teacher_id) = teacher_id {
            query = query.filter(student::Column::TeacherId.eq(teacher_id));
        }

        query
            .order_by(student::Column::CreatedAt, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count students owned by a teacher.
    pub async fn count_by_teacher(&self, teacher_id: &str) -> AppResult<u64> {
        Student::find()
            .filter(student::Column::TeacherId.eq(teacher_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a user and its student profile in one transaction.
    pub async fn create_with_user(
        &self,
        user: user::ActiveModel,
        profile: student::ActiveModel,
    ) -> AppResult<(user::Model, student::Model)> {
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
            .map_err(|e| super::map_insert_err(e, "Student"))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((user, profile))
    }

    /// Update profile tags. `None` leaves a field unchanged.
    pub async fn update(
        &self,
        id: &str,
        disability: Option<Option<String>>,
        learning_style: Option<Option<String>>,
    ) -> AppResult<student::Model> {
        let student = self.get_by_id(id).await?;

        let mut active: student::ActiveModel = student.into();

        if let Some(disability) = disability {
            active.disability = Set(disability);
        }
        if let Some(learning_style) = learning_style {
            active.learning_style = Set(learning_style);
        }

        active.updated_at = Set(Some(Utc::now().into()));

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a student profile and its user in one transaction.
    pub async fn delete_with_user(&self, student: &student::Model) -> AppResult<()> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Student::delete_by_id(&student.id)
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        User::delete_by_id(&student.user_id)
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Stamp for new profiles.
    #[must_use]
    pub fn new_profile(
        id: String,
        user_id: String,
        teacher_id: String,
        disability: Option<String>,
        learning_style: Option<String>,
    ) -> student::ActiveModel {
        student::ActiveModel {
            id: Set(id),
            user_id: Set(user_id),
            teacher_id: Set(teacher_id),
            disability: Set(disability),
            learning_style: Set(learning_style),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_student(id: &str, teacher_id: &str) -> student::Model {
        student::Model {
            id: id.to_string(),
            user_id: format!("user-{id}"),
            teacher_id: teacher_id.to_string(),
            disability: Some("dyslexia".to_string()),
            learning_style: Some("visual".to_string()),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let student = create_test_student("s1", "t1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[student]])
                .into_connection(),
        );

        let repo = StudentRepository::new(db);
        let result = repo.get_by_id("s1").await.unwrap();

        assert_eq!(result.teacher_id, "t1");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<student::Model>::new()])
                .into_connection(),
        );

        let repo = StudentRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_count_by_teacher() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(3))
                }]])
                .into_connection(),
        );

        let repo = StudentRepository::new(db);
        assert_eq!(repo.count_by_teacher("t1").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_update_keeps_absent_fields() {
        let student = create_test_student("s1", "t1");
        let updated = student::Model {
            learning_style: Some("auditory".to_string()),
            updated_at: Some(Utc::now().into()),
            ..student.clone()
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[student]])
                .append_query_results([[updated]])
                .into_connection(),
        );

        let repo = StudentRepository::new(db);
        let result = repo
            .update("s1", None, Some(Some("auditory".to_string())))
            .await
            .unwrap();

        assert_eq!(result.disability.as_deref(), Some("dyslexia"));
        assert_eq!(result.learning_style.as_deref(), Some("auditory"));
    }
}
