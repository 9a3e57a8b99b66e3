//! Authentication and member management service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use uuid::Uuid;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{
        enums::Role,
        user::{RegisterUser, UpdateProfile, User, UserClaims, UserQuery, UserShort},
    },
    repository::Repository,
};

const BAD_CREDENTIALS: &str = "Invalid email or password";

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Self-service sign-up. New accounts get the `member` role.
    pub async fn register(&self, data: &RegisterUser) -> AppResult<User> {
        let hash = hash_password(&data.password)?;
        let user = self
            .repository
            .users
            .create(&data.email, &data.name, Role::Member, &hash)
            .await?;
        tracing::info!("Member {} registered ({})", user.id, user.email);
        Ok(user)
    }

    /// Authenticate by email and password and return a JWT token
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users
            .get_by_email(email)
            .await?
            .ok_or_else(|| AppError::Authentication(BAD_CREDENTIALS.to_string()))?;

        if !verify_password(&user.password_hash, password)? {
            tracing::warn!("Failed login for {}", email);
            return Err(AppError::Authentication(BAD_CREDENTIALS.to_string()));
        }

        let token = self.create_token_for_user(&user)?;
        Ok((token, user))
    }

    fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        UserClaims::for_user(user, self.config.jwt_expiration_hours)
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Search members with loan counters
    pub async fn search_users(&self, query: &UserQuery) -> AppResult<(Vec<UserShort>, i64)> {
        self.repository.users.search(query).await
    }

    /// Update own profile. Changing the password requires the current one.
    pub async fn update_profile(&self, user_id: Uuid, profile: &UpdateProfile) -> AppResult<User> {
        let user = self.repository.users.get_by_id(user_id).await?;

        let password_hash = match &profile.new_password {
            Some(new_password) => {
                let current = profile.current_password.as_deref().ok_or_else(|| {
                    AppError::Validation("Current password required to change password".to_string())
                })?;
                if !verify_password(&user.password_hash, current)? {
                    return Err(AppError::Authentication("Current password is incorrect".to_string()));
                }
                Some(hash_password(new_password)?)
            }
            None => None,
        };

        self.repository
            .users
            .update_profile(
                user_id,
                profile.name.as_deref(),
                profile.email.as_deref(),
                password_hash.as_deref(),
            )
            .await
    }

    /// Change a member's role. The last admin cannot be demoted.
    pub async fn update_role(&self, user_id: Uuid, role: Role) -> AppResult<User> {
        let user = self.repository.users.get_by_id(user_id).await?;

        if user.role == Role::Admin && role != Role::Admin {
            self.ensure_other_admin().await?;
        }

        let updated = self.repository.users.update_role(user_id, role).await?;
        tracing::info!("User {} role changed from {} to {}", user_id, user.role, role);
        Ok(updated)
    }

    /// Delete a member. Refused while copies are out with them unless `force`.
    pub async fn delete_user(&self, user_id: Uuid, force: bool) -> AppResult<()> {
        let user = self.repository.users.get_by_id(user_id).await?;

        if user.role == Role::Admin {
            self.ensure_other_admin().await?;
        }

        if !force {
            let active = self.repository.users.count_active_loans(user_id).await?;
            if active > 0 {
                return Err(AppError::Conflict(format!(
                    "Member has {} active loan(s)",
                    active
                )));
            }
        }

        self.repository.users.delete(user_id).await?;
        tracing::info!("User {} deleted (force={})", user_id, force);
        Ok(())
    }

    /// Create the configured admin account when no admin exists yet
    pub async fn ensure_bootstrap_admin(&self) -> AppResult<()> {
        let (Some(email), Some(password)) = (
            self.config.bootstrap_admin_email.as_deref(),
            self.config.bootstrap_admin_password.as_deref(),
        ) else {
            return Ok(());
        };

        if self.repository.users.count_by_role(Role::Admin).await? > 0 {
            return Ok(());
        }

        if let Some(existing) = self.repository.users.get_by_email(email).await? {
            self.repository.users.update_role(existing.id, Role::Admin).await?;
            tracing::info!("Promoted {} to admin", email);
            return Ok(());
        }

        let hash = hash_password(password)?;
        self.repository
            .users
            .create(email, "Administrator", Role::Admin, &hash)
            .await?;
        tracing::info!("Created bootstrap admin {}", email);
        Ok(())
    }

    async fn ensure_other_admin(&self) -> AppResult<()> {
        if self.repository.users.count_by_role(Role::Admin).await? <= 1 {
            return Err(AppError::BusinessRule(
                "Cannot remove the last administrator".to_string(),
            ));
        }
        Ok(())
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

/// Check `password` against a stored Argon2 hash
pub fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_password_verifies() {
        let hash = hash_password("correct horse").unwrap();
        assert_ne!(hash, "correct horse");
        assert!(verify_password(&hash, "correct horse").unwrap());
        assert!(!verify_password(&hash, "battery staple").unwrap());
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let a = hash_password("password1").unwrap();
        let b = hash_password("password1").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_hash_is_an_internal_error() {
        assert!(matches!(
            verify_password("not-a-hash", "x"),
            Err(AppError::Internal(_))
        ));
    }
}
