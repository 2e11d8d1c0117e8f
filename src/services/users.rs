//! Registration, authentication and permission management

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use validator::ValidationErrors;

use crate::{
    config::{AuthConfig, BootstrapAdmin},
    error::{AppError, AppResult},
    models::user::{username_taken, Permission, RegisterUser, User, UserClaims},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Creates a patron account and signs them in
    pub async fn register(&self, data: RegisterUser) -> AppResult<(String, User)> {
        let mut errors = match data.check() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };

        if !data.username.is_empty() && self.repository.users.username_exists(&data.username).await? {
            errors.add("username", username_taken());
        }
        if !errors.errors().is_empty() {
            return Err(AppError::InvalidFields(errors));
        }

        let password_hash = hash_password(&data.password)?;
        let user = self
            .repository
            .users
            .create(&data.username, &password_hash, false)
            .await?;
        tracing::info!(user_id = user.id, username = %user.username, "User registered");

        let token = self.create_token_for_user(&user).await?;
        Ok((token, user))
    }

    /// Authenticate user by username and return JWT token
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users
            .get_by_username(username)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid username or password".to_string()))?;

        if !verify_password(&user, password)? {
            tracing::debug!(username, "Rejected login");
            return Err(AppError::Authentication("Invalid username or password".to_string()));
        }

        let token = self.create_token_for_user(&user).await?;
        Ok((token, user))
    }

    /// Replaces a user's permissions. Takes effect at their next login.
    pub async fn set_permissions(
        &self,
        claims: &UserClaims,
        user_id: i32,
        permissions: Vec<Permission>,
    ) -> AppResult<Vec<Permission>> {
        claims.require_superuser()?;

        self.repository
            .users
            .set_permissions(user_id, &permissions)
            .await?;
        tracing::info!(user_id, granted_by = claims.user_id, ?permissions, "Permissions updated");

        self.repository.users.permissions(user_id).await
    }

    /// Creates the configured superuser unless the username is taken
    pub async fn ensure_bootstrap_admin(&self, admin: &BootstrapAdmin) -> AppResult<()> {
        if self.repository.users.username_exists(&admin.username).await? {
            tracing::debug!(username = %admin.username, "Bootstrap admin already exists");
            return Ok(());
        }

        let password_hash = hash_password(&admin.password)?;
        let user = self
            .repository
            .users
            .create(&admin.username, &password_hash, true)
            .await?;
        tracing::info!(user_id = user.id, username = %user.username, "Bootstrap admin created");
        Ok(())
    }

    async fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        let permissions = self.repository.users.permissions(user.id).await?;

        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: user.username.clone(),
            user_id: user.id,
            is_superuser: user.is_superuser,
            permissions,
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

fn verify_password(user: &User, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
