//! Student service.

use edumatch_common::{AppError, AppResult, IdGenerator};
use edumatch_db::{
    entities::{
        student,
        user::{self, UserRole},
    },
    repositories::{FeedbackRepository, RecommendationRepository, StudentRepository, UserRepository},
};
use serde::Deserialize;
use tracing::{info, warn};
use validator::Validate;

use super::{account::NewCredentials, notification::NotificationService};
use crate::access::{Access, Actor, OwnershipGuard};
use crate::tags::normalize_tag;

/// Input for adding a student.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudentInput {
    /// Login name.
    pub username: String,
    /// Account email.
    pub email: String,
    /// At least 8 characters.
    pub password: String,

    /// Disability tag, matched case-insensitively.
    #[validate(length(max = 64))]
    pub disability: Option<String>,

    /// Learning style tag.
    #[validate(length(max = 64))]
    pub learning_style: Option<String>,
}

/// Input for updating a student's tags.
///
/// Absent fields are left unchanged; a blank string clears the field.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStudentInput {
    /// Disability tag, matched case-insensitively.
    #[validate(length(max = 64))]
    pub disability: Option<String>,

    /// Learning style tag.
    #[validate(length(max = 64))]
    pub learning_style: Option<String>,
}

/// Student profiles owned by teachers.
#[derive(Clone)]
pub struct StudentService {
    student_repo: StudentRepository,
    user_repo: UserRepository,
    recommendation_repo: RecommendationRepository,
    feedback_repo: FeedbackRepository,
    notification_service: NotificationService,
    guard: OwnershipGuard,
    id_gen: IdGenerator,
}

impl StudentService {
    /// Create a new student service.
    #[must_use]
    pub const fn new(
        student_repo: StudentRepository,
        user_repo: UserRepository,
        recommendation_repo: RecommendationRepository,
        feedback_repo: FeedbackRepository,
        notification_service: NotificationService,
        guard: OwnershipGuard,
    ) -> Self {
        Self {
            student_repo,
            user_repo,
            recommendation_repo,
            feedback_repo,
            notification_service,
            guard,
            id_gen: IdGenerator::new(),
        }
    }

    /// Add a student owned by the calling teacher.
    pub async fn create(
        &self,
        actor: &Actor,
        input: CreateStudentInput,
    ) -> AppResult<(student::Model, user::Model)> {
        let teacher_id = actor
            .teacher_id()
            .ok_or_else(|| AppError::Forbidden("Only teachers can add students".to_string()))?
            .to_string();
        input.validate()?;

        let user_id = self.id_gen.generate();
        let user_model = NewCredentials {
            username: &input.username,
            email: &input.email,
            password: &input.password,
        }
        .into_user(
            &self.user_repo,
            &self.id_gen,
            user_id.clone(),
            UserRole::Student,
        )
        .await?;

        let profile = StudentRepository::new_profile(
            self.id_gen.generate(),
            user_id,
            teacher_id,
            input.disability.as_deref().and_then(normalize_tag),
            input.learning_style.as_deref().and_then(normalize_tag),
        );

        let (user, student) = self
            .student_repo
            .create_with_user(user_model, profile)
            .await?;

        info!(actor = %actor, student_id = %student.id, "Student created");

        // best effort
        if let Err(e) = self
            .notification_service
            .notify(
                actor.user_id(),
                format!("New student \"{}\" added", user.username),
            )
            .await
        {
            warn!(actor = %actor, student_id = %student.id, error = %e, "Failed to notify teacher");
        }

        Ok((student, user))
    }

    /// Students visible to the actor: all for admins, own for teachers.
    pub async fn list(
        &self,
        actor: &Actor,
    ) -> AppResult<Vec<(student::Model, Option<user::Model>)>> {
        match actor {
            Actor::Admin { .. } => self.student_repo.find_with_user(None).await,
            Actor::Teacher {
                teacher_id: Some(teacher_id),
                ..
            } => self.student_repo.find_with_user(Some(teacher_id)).await,
            Actor::Teacher { .. } => Ok(Vec::new()),
            Actor::Student { .. } => Err(AppError::Forbidden(
                "Students cannot list students".to_string(),
            )),
        }
    }

    /// Get a student the actor may view.
    pub async fn get(&self, actor: &Actor, id: &str) -> AppResult<student::Model> {
        self.guard.authorize_student(actor, id, Access::View).await
    }

    /// Update a student's tags.
    pub async fn update(
        &self,
        actor: &Actor,
        id: &str,
        input: UpdateStudentInput,
    ) -> AppResult<student::Model> {
        input.validate()?;
        self.guard.authorize_student(actor, id, Access::Manage).await?;

        let normalize = |value: Option<String>| value.map(|v| normalize_tag(&v));

        self.student_repo
            .update(
                id,
                normalize(input.disability),
                normalize(input.learning_style),
            )
            .await
    }

    /// Delete a student and its account.
    ///
    /// Refused while recommendations or feedback reference the student.
    pub async fn delete(&self, actor: &Actor, id: &str) -> AppResult<()> {
        let student = self.guard.authorize_student(actor, id, Access::Manage).await?;

        if self.recommendation_repo.count_by_student(id).await? > 0
            || self.feedback_repo.count_by_student(id).await? > 0
        {
            return Err(AppError::Conflict(
                "Student has recommendations or feedback".to_string(),
            ));
        }

        self.student_repo.delete_with_user(&student).await?;

        info!(actor = %actor, student_id = %id, "Student deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use edumatch_db::{entities::notification, repositories::{NotificationRepository, TeacherRepository}};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    struct Mocks {
        student: MockDatabase,
        user: MockDatabase,
        recommendation: MockDatabase,
        feedback: MockDatabase,
        notification: MockDatabase,
    }

    impl Default for Mocks {
        fn default() -> Self {
            Self {
                student: MockDatabase::new(DatabaseBackend::Postgres),
                user: MockDatabase::new(DatabaseBackend::Postgres),
                recommendation: MockDatabase::new(DatabaseBackend::Postgres),
                feedback: MockDatabase::new(DatabaseBackend::Postgres),
                notification: MockDatabase::new(DatabaseBackend::Postgres),
            }
        }
    }

    impl Mocks {
        fn into_service(self) -> StudentService {
            let student_db = Arc::new(self.student.into_connection());
            let student_repo = StudentRepository::new(Arc::clone(&student_db));

            StudentService::new(
                student_repo.clone(),
                UserRepository::new(Arc::new(self.user.into_connection())),
                RecommendationRepository::new(Arc::new(self.recommendation.into_connection())),
                FeedbackRepository::new(Arc::new(self.feedback.into_connection())),
                NotificationService::new(NotificationRepository::new(Arc::new(
                    self.notification.into_connection(),
                ))),
                OwnershipGuard::new(
                    student_repo,
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

    fn create_test_user(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: "sam".to_string(),
            email: "sam@example.com".to_string(),
            password_hash: "hash".to_string(),
            role: UserRole::Student,
            token: "token".to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn count_row(n: i64) -> [std::collections::BTreeMap<&'static str, sea_orm::Value>; 1] {
        [maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(n)) }]
    }

    #[tokio::test]
    async fn test_create_notifies_teacher() {
        let student = create_test_student("s1", "t1");
        let user = create_test_user("user-s1");
        let notice = notification::Model {
            id: "n1".to_string(),
            recipient_id: "user-t1".to_string(),
            message: "New student \"sam\" added".to_string(),
            is_read: false,
            created_at: Utc::now().into(),
        };

        let service = Mocks {
            user: MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .append_query_results([Vec::<user::Model>::new()]),
            student: MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .append_query_results([[student]]),
            notification: MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[notice]]),
            ..Mocks::default()
        }
        .into_service();

        let (created, account) = service
            .create(
                &teacher("t1"),
                CreateStudentInput {
                    username: "sam".to_string(),
                    email: "sam@example.com".to_string(),
                    password: "long-enough".to_string(),
                    disability: Some(" Dyslexia".to_string()),
                    learning_style: Some("VISUAL".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(created.teacher_id, "t1");
        assert_eq!(account.username, "sam");
    }

    #[tokio::test]
    async fn test_admin_cannot_create_without_teacher_profile() {
        let service = Mocks::default().into_service();
        let admin = Actor::Admin {
            user_id: "root".to_string(),
        };

        let result = service
            .create(
                &admin,
                CreateStudentInput {
                    username: "sam".to_string(),
                    email: "sam@example.com".to_string(),
                    password: "long-enough".to_string(),
                    disability: None,
                    learning_style: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_student_cannot_list() {
        let service = Mocks::default().into_service();
        let actor = Actor::Student {
            user_id: "u".to_string(),
            student_id: Some("s1".to_string()),
        };

        assert!(matches!(
            service.list(&actor).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_get_other_teachers_student_forbidden() {
        let service = Mocks {
            student: MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_student("s1", "t9")]]),
            ..Mocks::default()
        }
        .into_service();

        let result = service.get(&teacher("t7"), "s1").await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_delete_with_recommendations_conflicts() {
        let service = Mocks {
            student: MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_student("s1", "t1")]]),
            recommendation: MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([count_row(1)]),
            ..Mocks::default()
        }
        .into_service();

        let result = service.delete(&teacher("t1"), "s1").await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_delete_removes_profile_and_account() {
        let service = Mocks {
            student: MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_student("s1", "t1")]])
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ]),
            recommendation: MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([count_row(0)]),
            feedback: MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([count_row(0)]),
            ..Mocks::default()
        }
        .into_service();

        assert!(service.delete(&teacher("t1"), "s1").await.is_ok());
    }
}
