//! Append-only audit log storage.

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};

use super::entities::audit_log::{self, ActiveModel, Entity as AuditLogEntity};
use crate::domain::{AuditLog, NewAuditLog};
use crate::errors::AppResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn append(&self, entry: NewAuditLog) -> AppResult<()>;

    /// Full history, newest first
    async fn list(&self) -> AppResult<Vec<AuditLog>>;
}

pub struct AuditStore {
    db: DatabaseConnection,
}

impl AuditStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuditRepository for AuditStore {
    async fn append(&self, entry: NewAuditLog) -> AppResult<()> {
        ActiveModel {
            id: Set(entry.id),
            username: Set(entry.username),
            action: Set(entry.action),
            entity_name: Set(entry.entity_name),
            entity_id: Set(entry.entity_id),
            details: Set(entry.details),
            created_at: Set(entry.created_at),
        }
        .insert(&self.db)
        .await?;
        Ok(())
    }

    async fn list(&self) -> AppResult<Vec<AuditLog>> {
        let models = AuditLogEntity::find()
            .order_by_desc(audit_log::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(AuditLog::from).collect())
    }
}
