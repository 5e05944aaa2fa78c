//! Account service: sign-in, bearer tokens and the bootstrap admin.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use edumatch_common::{config::BootstrapConfig, AppError, AppResult, IdGenerator};
use edumatch_db::{
    entities::{
        student, teacher,
        user::{self, UserRole},
    },
    repositories::{StudentRepository, TeacherRepository, UserRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

/// Input for signing in.
#[derive(Debug, Deserialize, Validate)]
pub struct SigninInput {
    /// Account email.
    #[validate(email)]
    pub email: String,

    /// Plain-text password.
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// The signed-in user with whichever role profile it has.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountProfile {
    /// The account.
    pub user: user::Model,
    /// Set for teachers.
    pub teacher_profile: Option<teacher::Model>,
    /// Set for students.
    pub student_profile: Option<student::Model>,
}

/// Credentials for a new account.
#[derive(Debug, Validate)]
pub(crate) struct NewCredentials<'a> {
    #[validate(length(min = 1, max = 64))]
    pub username: &'a str,

    #[validate(email)]
    pub email: &'a str,

    #[validate(length(min = 8, max = 128))]
    pub password: &'a str,
}

impl NewCredentials<'_> {
    /// Validate, check uniqueness and build the user row.
    pub(crate) async fn into_user(
        self,
        user_repo: &UserRepository,
        id_gen: &IdGenerator,
        user_id: String,
        role: UserRole,
    ) -> AppResult<user::ActiveModel> {
        self.validate()?;

        let email = self.email.trim().to_lowercase();
        if user_repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }
        if user_repo.find_by_username(self.username).await?.is_some() {
            return Err(AppError::Conflict("Username already taken".to_string()));
        }

        Ok(user::ActiveModel {
            id: Set(user_id),
            username: Set(self.username.to_string()),
            email: Set(email),
            password_hash: Set(hash_password(self.password)?),
            role: Set(role),
            token: Set(id_gen.generate_token()),
            created_at: Set(Utc::now().into()),
        })
    }
}

/// Account service for authentication.
#[derive(Clone)]
pub struct AccountService {
    user_repo: UserRepository,
    teacher_repo: TeacherRepository,
    student_repo: StudentRepository,
    id_gen: IdGenerator,
}

impl AccountService {
    /// Create a new account service.
    #[must_use]
    pub const fn new(
        user_repo: UserRepository,
        teacher_repo: TeacherRepository,
        student_repo: StudentRepository,
    ) -> Self {
        Self {
            user_repo,
            teacher_repo,
            student_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Authenticate by email and password.
    ///
    /// The returned user carries its current bearer token.
    pub async fn signin(&self, input: SigninInput) -> AppResult<user::Model> {
        input.validate()?;

        let user = self
            .user_repo
            .find_by_email(input.email.trim())
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(&input.password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        info!(user_id = %user.id, role = user.role.as_str(), "User signed in");
        Ok(user)
    }

    /// Authenticate a user by token.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Invalidate the current token by rotating it.
    pub async fn signout(&self, user_id: &str) -> AppResult<()> {
        self.user_repo
            .update_token(user_id, self.id_gen.generate_token())
            .await?;

        info!(user_id = %user_id, "User signed out");
        Ok(())
    }

    /// The user together with its role profile.
    pub async fn me(&self, user: user::Model) -> AppResult<AccountProfile> {
        let (teacher_profile, student_profile) = match user.role {
            UserRole::Teacher => (self.teacher_repo.find_by_user_id(&user.id).await?, None),
            UserRole::Student => (None, self.student_repo.find_by_user_id(&user.id).await?),
            UserRole::Admin => (None, None),
        };

        Ok(AccountProfile {
            user,
            teacher_profile,
            student_profile,
        })
    }

    /// Create the configured admin when no admin exists yet.
    ///
    /// Returns the new admin, or `None` when nothing was created.
    pub async fn ensure_bootstrap_admin(
        &self,
        bootstrap: &BootstrapConfig,
    ) -> AppResult<Option<user::Model>> {
        let Some((username, email, password)) = bootstrap.admin_credentials() else {
            return Ok(None);
        };

        if self.user_repo.find_any_admin().await?.is_some() {
            return Ok(None);
        }

        let model = NewCredentials {
            username,
            email,
            password,
        }
        .into_user(
            &self.user_repo,
            &self.id_gen,
            self.id_gen.generate(),
            UserRole::Admin,
        )
        .await?;

        let admin = self.user_repo.create(model).await?;
        info!(user_id = %admin.id, username = %admin.username, "Created bootstrap admin");

        Ok(Some(admin))
    }
}

/// Hash a password with argon2.
pub(crate) fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
