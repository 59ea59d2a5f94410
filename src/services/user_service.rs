//! User service - Profile reads, updates and soft deletion.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use super::audit_service::AuditRecorder;
use crate::config::{is_valid_role, AUDIT_ACTION_DELETE, AUDIT_ACTION_UPDATE};
use crate::domain::{Actor, NewAuditLog, Password, ProfileChange, UpdateUser, User, UserRole};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;

/// User service trait for dependency injection.
///
/// Operations only ever see active users; deleted accounts are invisible.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Get an active user (self or admin)
    async fn get_user(&self, actor: &Actor, username: &str) -> AppResult<User>;

    /// List all active users (admin only)
    async fn list_users(&self, actor: &Actor) -> AppResult<Vec<User>>;

    /// Update phone, password or role
    async fn update_user(&self, actor: &Actor, username: &str, input: UpdateUser) -> AppResult<User>;

    /// Soft delete a user (self or admin; admins cannot delete themselves)
    async fn delete_user(&self, actor: &Actor, username: &str) -> AppResult<()>;
}

/// Concrete implementation of UserService using Unit of Work.
pub struct UserManager<U: UnitOfWork> {
    uow: Arc<U>,
    audit: Arc<dyn AuditRecorder>,
}

impl<U: UnitOfWork> UserManager<U> {
    pub fn new(uow: Arc<U>, audit: Arc<dyn AuditRecorder>) -> Self {
        Self { uow, audit }
    }

    async fn load(&self, username: &str) -> AppResult<User> {
        self.uow
            .users()
            .find_by_username(username)
            .await?
            .ok_or_not_found("User")
    }
}

#[async_trait]
impl<U: UnitOfWork> UserService for UserManager<U> {
    async fn get_user(&self, actor: &Actor, username: &str) -> AppResult<User> {
        if actor.username != username {
            actor.require_admin()?;
        }
        self.load(username).await
    }

    async fn list_users(&self, actor: &Actor) -> AppResult<Vec<User>> {
        actor.require_admin()?;
        self.uow.users().list().await
    }

    async fn update_user(&self, actor: &Actor, username: &str, input: UpdateUser) -> AppResult<User> {
        actor.authorize_profile_change(
            username,
            ProfileChange {
                changes_role: input.role.is_some(),
            },
        )?;

        if let Some(role) = &input.role {
            if !is_valid_role(role) {
                return Err(AppError::field("role", format!("Unknown role '{}'", role)));
            }
        }

        let mut user = self.load(username).await?;

        if let Some(phone) = input.phone {
            let phone = phone.trim().to_string();
            user.phone = if phone.is_empty() { None } else { Some(phone) };
        }
        if let Some(role) = input.role {
            user.role = UserRole::from(role.as_str());
        }
        if let Some(password) = input.password {
            user.password_hash = Password::new(&password)?.into_string();
        }
        user.updated_at = Utc::now();

        let updated = self.uow.users().update(&user).await?;

        self.audit.record(
            NewAuditLog::new(&actor.username, AUDIT_ACTION_UPDATE, "User").entity_id(username),
        );
        Ok(updated)
    }

    async fn delete_user(&self, actor: &Actor, username: &str) -> AppResult<()> {
        if actor.is_admin() && actor.username == username {
            return Err(AppError::validation("Admins cannot delete their own account"));
        }
        actor.authorize_profile_change(username, ProfileChange::default())?;

        let mut user = self.load(username).await?;
        user.soft_delete();
        self.uow.users().update(&user).await?;

        tracing::info!(username = %username, actor = %actor.username, "User soft-deleted");
        self.audit.record(
            NewAuditLog::new(&actor.username, AUDIT_ACTION_DELETE, "User").entity_id(username),
        );
        Ok(())
    }
}
