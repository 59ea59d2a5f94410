//! User repository implementation with soft delete support.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use crate::domain::{NewUser, User};
use crate::errors::{AppError, AppResult, OptionExt};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection.
///
/// By default, query methods exclude soft-deleted records.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find active user by username (excludes soft-deleted)
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Find user by username including soft-deleted
    async fn find_by_username_with_deleted(&self, username: &str) -> AppResult<Option<User>>;

    /// Create a new user
    async fn create(&self, user: NewUser) -> AppResult<User>;

    /// Persist every mutable field of `user` (role, phone, password hash,
    /// refresh token, soft delete flag)
    async fn update(&self, user: &User) -> AppResult<User>;

    /// List all active users (excludes soft-deleted)
    async fn list(&self) -> AppResult<Vec<User>>;
}

/// Concrete implementation of UserRepository with soft delete
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn map_insert_error(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::duplicate("User"),
        _ => AppError::from(err),
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find_by_id(username.to_string())
            .filter(user::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?;

        Ok(result.map(User::from))
    }

    async fn find_by_username_with_deleted(&self, username: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find_by_id(username.to_string())
            .one(&self.db)
            .await?;

        Ok(result.map(User::from))
    }

    async fn create(&self, user: NewUser) -> AppResult<User> {
        let now = Utc::now();
        let active_model = ActiveModel {
            username: Set(user.username),
            password_hash: Set(user.password_hash),
            role: Set(user.role.to_string()),
            phone: Set(user.phone),
            refresh_token: Set(None),
            refresh_token_expires_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };

        let model = active_model.insert(&self.db).await.map_err(map_insert_error)?;
        Ok(User::from(model))
    }

    async fn update(&self, user: &User) -> AppResult<User> {
        let existing = UserEntity::find_by_id(user.username.clone())
            .one(&self.db)
            .await?
            .ok_or_not_found("User")?;

        let mut active: ActiveModel = existing.into();
        active.password_hash = Set(user.password_hash.clone());
        active.role = Set(user.role.to_string());
        active.phone = Set(user.phone.clone());
        active.refresh_token = Set(user.refresh_token.clone());
        active.refresh_token_expires_at = Set(user.refresh_token_expires_at);
        active.deleted_at = Set(user.deleted_at);
        active.updated_at = Set(user.updated_at);

        let model = active.update(&self.db).await?;
        Ok(User::from(model))
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        let models = UserEntity::find()
            .filter(user::Column::DeletedAt.is_null())
            .order_by_asc(user::Column::Username)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(User::from).collect())
    }
}
