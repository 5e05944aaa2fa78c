//! Teacher service (admin only).

use edumatch_common::{AppError, AppResult, IdGenerator};
use edumatch_db::{
    entities::{
        teacher,
        user::{self, UserRole},
    },
    repositories::{StudentRepository, TeacherRepository, UserRepository},
};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::account::NewCredentials;
use crate::access::Actor;

/// Input for creating a teacher account.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTeacherInput {
    /// Login name.
    pub username: String,
    /// Account email.
    pub email: String,
    /// At least 8 characters.
    pub password: String,

    /// Subject taught.
    #[validate(length(max = 128))]
    pub subject: Option<String>,
}

/// Input for updating a teacher profile.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTeacherInput {
    /// Subject taught; absent or blank clears it.
    #[validate(length(max = 128))]
    pub subject: Option<String>,
}

/// Teacher account management.
#[derive(Clone)]
pub struct TeacherService {
    teacher_repo: TeacherRepository,
    student_repo: StudentRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl TeacherService {
    /// Create a new teacher service.
    #[must_use]
    pub const fn new(
        teacher_repo: TeacherRepository,
        student_repo: StudentRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            teacher_repo,
            student_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a teacher user and profile.
    pub async fn create(
        &self,
        actor: &Actor,
        input: CreateTeacherInput,
    ) -> AppResult<(teacher::Model, user::Model)> {
        actor.require_admin()?;
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
            UserRole::Teacher,
        )
        .await?;

        let profile = TeacherRepository::new_profile(
            self.id_gen.generate(),
            user_id,
            normalize_subject(input.subject),
        );

        let (user, teacher) = self
            .teacher_repo
            .create_with_user(user_model, profile)
            .await?;

        info!(actor = %actor, teacher_id = %teacher.id, "Teacher created");
        Ok((teacher, user))
    }

    /// List all teachers.
    pub async fn list(
        &self,
        actor: &Actor,
    ) -> AppResult<Vec<(teacher::Model, Option<user::Model>)>> {
        actor.require_admin()?;
        self.teacher_repo.find_all_with_user().await
    }

    /// Get a teacher with its account.
    pub async fn get(
        &self,
        actor: &Actor,
        id: &str,
    ) -> AppResult<(teacher::Model, Option<user::Model>)> {
        actor.require_admin()?;

        let teacher = self
            .teacher_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Teacher not found: {id}")))?;
        let user = self.user_repo.find_by_id(&teacher.user_id).await?;

        Ok((teacher, user))
    }

    /// Update a teacher's subject.
    pub async fn update(
        &self,
        actor: &Actor,
        id: &str,
        input: UpdateTeacherInput,
    ) -> AppResult<teacher::Model> {
        actor.require_admin()?;
        input.validate()?;

        self.teacher_repo
            .update_subject(id, normalize_subject(input.subject))
            .await
    }

    /// Delete a teacher and its account.
    ///
    /// Refused while the teacher still owns students.
    pub async fn delete(&self, actor: &Actor, id: &str) -> AppResult<()> {
        actor.require_admin()?;

        let teacher = self
            .teacher_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Teacher not found: {id}")))?;

        if self.student_repo.count_by_teacher(&teacher.id).await? > 0 {
            return Err(AppError::Conflict(
                "Teacher still has students assigned".to_string(),
            ));
        }

        self.teacher_repo.delete_with_user(&teacher).await?;

        info!(actor = %actor, teacher_id = %id, "Teacher deleted");
        Ok(())
    }
}

fn normalize_subject(subject: Option<String>) -> Option<String> {
    subject
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
