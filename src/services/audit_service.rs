//! Audit trail.
//!
//! Mutating operations hand their audit entry to an `AuditRecorder` and move
//! on. The production recorder queues entries for a background writer, so a
//! failed or slow audit write never affects the operation that produced it.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::domain::{Actor, AuditLog, NewAuditLog};
use crate::errors::AppResult;
use crate::infra::{AuditRepository, UnitOfWork};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Fire-and-forget sink for audit entries.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait AuditRecorder: Send + Sync {
    fn record(&self, entry: NewAuditLog);
}

/// Recorder backed by a queue drained by one background task.
#[derive(Clone)]
pub struct AuditTrail {
    sender: mpsc::UnboundedSender<NewAuditLog>,
}

impl AuditTrail {
    /// Start the writer task. It stops once every `AuditTrail` clone is
    /// dropped and the queue is drained.
    pub fn spawn(repo: Arc<dyn AuditRepository>) -> (Self, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::unbounded_channel::<NewAuditLog>();

        let handle = tokio::spawn(async move {
            while let Some(entry) = receiver.recv().await {
                let action = entry.action.clone();
                let entity = entry.entity_name.clone();
                if let Err(e) = repo.append(entry).await {
                    tracing::warn!(
                        action = %action,
                        entity = %entity,
                        error = %e,
                        "Failed to write audit log entry"
                    );
                }
            }
            tracing::debug!("Audit writer stopped");
        });

        (Self { sender }, handle)
    }
}

impl AuditRecorder for AuditTrail {
    fn record(&self, entry: NewAuditLog) {
        if let Err(e) = self.sender.send(entry) {
            tracing::warn!(
                action = %e.0.action,
                entity = %e.0.entity_name,
                "Audit writer is not running, dropping entry"
            );
        }
    }
}

/// Read access to the audit history.
#[async_trait]
pub trait AuditService: Send + Sync {
    /// Full history, newest first (admin only)
    async fn list_audit_logs(&self, actor: &Actor) -> AppResult<Vec<AuditLog>>;
}

pub struct AuditManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> AuditManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> AuditService for AuditManager<U> {
    async fn list_audit_logs(&self, actor: &Actor) -> AppResult<Vec<AuditLog>> {
        actor.require_admin()?;
        self.uow.audit_logs().list().await
    }
}
