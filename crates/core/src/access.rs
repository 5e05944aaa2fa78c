//! Actor resolution and ownership checks.
//!
//! Every read or write on a student, its recommendations or its feedback
//! passes through [`can_act`]: a student may act on its own record, a
//! teacher on the students it owns, an admin on anything. An actor whose
//! role profile is missing is denied rather than treated as a failure.

use edumatch_common::{AppError, AppResult};
use edumatch_db::{
    entities::{
        student,
        user::{self, UserRole},
    },
    repositories::{StudentRepository, TeacherRepository},
};
use std::fmt;

/// The authenticated caller, with its role profile resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    /// A student account.
    Student {
        /// Account id.
        user_id: String,
        /// Student profile id, if one exists.
        student_id: Option<String>,
    },
    /// A teacher account.
    Teacher {
        /// Account id.
        user_id: String,
        /// Teacher profile id, if one exists.
        teacher_id: Option<String>,
    },
    /// An administrator.
    Admin {
        /// Account id.
        user_id: String,
    },
}

impl Actor {
    /// The account id behind this actor.
    #[must_use]
    pub fn user_id(&self) -> &str {
        match self {
            Self::Student { user_id, .. } | Self::Teacher { user_id, .. } | Self::Admin { user_id } => {
                user_id
            }
        }
    }

    /// Role of the underlying account.
    #[must_use]
    pub const fn role(&self) -> UserRole {
        match self {
            Self::Student { .. } => UserRole::Student,
            Self::Teacher { .. } => UserRole::Teacher,
            Self::Admin { .. } => UserRole::Admin,
        }
    }

    /// Whether the actor is an admin.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin { .. })
    }

    /// Teacher profile id, when the actor is a teacher with a profile.
    #[must_use]
    pub fn teacher_id(&self) -> Option<&str> {
        match self {
            Self::Teacher { teacher_id, .. } => teacher_id.as_deref(),
            _ => None,
        }
    }

    /// Fails unless the actor is an admin.
    pub fn require_admin(&self) -> AppResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin access required".to_string()))
        }
    }

    /// Fails unless the actor is a teacher or an admin.
    pub fn require_staff(&self) -> AppResult<()> {
        match self {
            Self::Teacher { .. } | Self::Admin { .. } => Ok(()),
            Self::Student { .. } => Err(AppError::Forbidden(
                "Teacher or admin access required".to_string(),
            )),
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.role().as_str(), self.user_id())
    }
}

/// The ownership facts of a student-scoped record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnedResource<'a> {
    /// The student the record belongs to.
    pub student_id: &'a str,
    /// Teacher who owns the student.
    pub teacher_id: &'a str,
}

impl<'a> From<&'a student::Model> for OwnedResource<'a> {
    fn from(student: &'a student::Model) -> Self {
        Self {
            student_id: &student.id,
            teacher_id: &student.teacher_id,
        }
    }
}

/// Whether `actor` may act on `resource`.
#[must_use]
pub fn can_act(actor: &Actor, resource: &OwnedResource<'_>) -> bool {
    match actor {
        Actor::Admin { .. } => true,
        Actor::Student {
            student_id: Some(id),
            ..
        } => id == resource.student_id,
        Actor::Teacher {
            teacher_id: Some(id),
            ..
        } => id == resource.teacher_id,
        _ => false,
    }
}

/// Level of access requested on a student.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Read, or annotate with feedback.
    View,
    /// Change the student or promote matches; never granted to students.
    Manage,
}

/// Resolves actors and guards student-scoped records.
#[derive(Clone)]
pub struct OwnershipGuard {
    student_repo: StudentRepository,
    teacher_repo: TeacherRepository,
}

impl OwnershipGuard {
    /// Create a new ownership guard.
    #[must_use]
    pub const fn new(student_repo: StudentRepository, teacher_repo: TeacherRepository) -> Self {
        Self {
            student_repo,
            teacher_repo,
        }
    }

    /// Resolve the role profile of an authenticated user.
    pub async fn resolve_actor(&self, user: &user::Model) -> AppResult<Actor> {
        let user_id = user.id.clone();

        Ok(match user.role {
            UserRole::Admin => Actor::Admin { user_id },
            UserRole::Teacher => Actor::Teacher {
                teacher_id: self
                    .teacher_repo
                    .find_by_user_id(&user.id)
                    .await?
                    .map(|t| t.id),
                user_id,
            },
            UserRole::Student => Actor::Student {
                student_id: self
                    .student_repo
                    .find_by_user_id(&user.id)
                    .await?
                    .map(|s| s.id),
                user_id,
            },
        })
    }

    /// Load a student and check the actor may access it.
    ///
    /// Fails with `NotFound` when the student is absent and `Forbidden`
    /// when the actor does not own it.
    pub async fn authorize_student(
        &self,
        actor: &Actor,
        student_id: &str,
        access: Access,
    ) -> AppResult<student::Model> {
        let student = self.student_repo.get_by_id(student_id).await?;

        if access == Access::Manage {
            actor.require_staff()?;
        }

        if !can_act(actor, &OwnedResource::from(&student)) {
            tracing::debug!(actor = %actor, student_id = %student_id, "Ownership check denied");
            return Err(AppError::Forbidden(
                "You do not have access to this student".to_string(),
            ));
        }

        Ok(student)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use edumatch_db::entities::teacher;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn teacher_actor(teacher_id: &str) -> Actor {
        Actor::Teacher {
            user_id: format!("user-{teacher_id}"),
            teacher_id: Some(teacher_id.to_string()),
        }
    }

    fn student_actor(student_id: Option<&str>) -> Actor {
        Actor::Student {
            user_id: "student-user".to_string(),
            student_id: student_id.map(str::to_string),
        }
    }

    fn create_test_student(id: &str, teacher_id: &str) -> student::Model {
        student::Model {
            id: id.to_string(),
            user_id: format!("user-{id}"),
            teacher_id: teacher_id.to_string(),
            disability: None,
            learning_style: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_user(id: &str, role: UserRole) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: id.to_string(),
            email: format!("{id}@example.com"),
            password_hash: "hash".to_string(),
            role,
            token: format!("token-{id}"),
            created_at: Utc::now().into(),
        }
    }

    fn guard(student_db: MockDatabase, teacher_db: MockDatabase) -> OwnershipGuard {
        OwnershipGuard::new(
            StudentRepository::new(Arc::new(student_db.into_connection())),
            TeacherRepository::new(Arc::new(teacher_db.into_connection())),
        )
    }

    #[test]
    fn test_teacher_owns_only_own_students() {
        let ours = OwnedResource {
            student_id: "s1",
            teacher_id: "7",
        };
        let theirs = OwnedResource {
            student_id: "s2",
            teacher_id: "9",
        };

        assert!(can_act(&teacher_actor("7"), &ours));
        assert!(!can_act(&teacher_actor("7"), &theirs));
    }

    #[test]
    fn test_student_acts_only_on_self() {
        let own = OwnedResource {
            student_id: "s1",
            teacher_id: "7",
        };
        let other = OwnedResource {
            student_id: "s2",
            teacher_id: "7",
        };

        assert!(can_act(&student_actor(Some("s1")), &own));
        assert!(!can_act(&student_actor(Some("s1")), &other));
    }

    #[test]
    fn test_admin_always_allowed() {
        let admin = Actor::Admin {
            user_id: "root".to_string(),
        };
        let resource = OwnedResource {
            student_id: "anything",
            teacher_id: "anyone",
        };

        assert!(can_act(&admin, &resource));
    }

    #[test]
    fn test_missing_profile_is_denied() {
        let resource = OwnedResource {
            student_id: "s1",
            teacher_id: "7",
        };
        let orphan_teacher = Actor::Teacher {
            user_id: "u".to_string(),
            teacher_id: None,
        };

        assert!(!can_act(&student_actor(None), &resource));
        assert!(!can_act(&orphan_teacher, &resource));
    }

    #[tokio::test]
    async fn test_resolve_actor_loads_teacher_profile() {
        let profile = teacher::Model {
            id: "7".to_string(),
            user_id: "tu".to_string(),
            subject: None,
            created_at: Utc::now().into(),
        };

        let guard = guard(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[profile]]),
        );

        let actor = guard
            .resolve_actor(&create_test_user("tu", UserRole::Teacher))
            .await
            .unwrap();

        assert_eq!(actor, teacher_actor_with_user("tu", "7"));
    }

    fn teacher_actor_with_user(user_id: &str, teacher_id: &str) -> Actor {
        Actor::Teacher {
            user_id: user_id.to_string(),
            teacher_id: Some(teacher_id.to_string()),
        }
    }

    #[tokio::test]
    async fn test_authorize_student_not_found() {
        let guard = guard(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<student::Model>::new()]),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let result = guard
            .authorize_student(&teacher_actor("7"), "missing", Access::View)
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_authorize_student_other_teacher_forbidden() {
        let guard = guard(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_student("s1", "9")]]),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let result = guard
            .authorize_student(&teacher_actor("7"), "s1", Access::View)
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_student_cannot_manage_self() {
        let guard = guard(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_student("s1", "7")]]),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let result = guard
            .authorize_student(&student_actor(Some("s1")), "s1", Access::Manage)
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
