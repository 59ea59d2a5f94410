//! Receipt service - Attach, replace, remove and list receipts.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use super::audit_service::AuditRecorder;
use super::scope;
use crate::config::{AUDIT_ACTION_DELETE, AUDIT_ACTION_UPDATE};
use crate::domain::{Actor, NewAuditLog, NewReceipt, Receipt, ReceiptFile};
use crate::errors::{AppResult, OptionExt};
use crate::infra::UnitOfWork;

#[async_trait]
pub trait ReceiptService: Send + Sync {
    /// Create or replace the receipt of an expense
    async fn attach_receipt(
        &self,
        actor: &Actor,
        target: Option<&str>,
        expense_id: Uuid,
        file: ReceiptFile,
    ) -> AppResult<Receipt>;

    async fn delete_receipt(&self, actor: &Actor, target: Option<&str>, receipt_id: Uuid)
        -> AppResult<()>;

    /// Metadata of the target's receipts
    async fn list_receipts(&self, actor: &Actor, target: Option<&str>) -> AppResult<Vec<Receipt>>;
}

pub struct ReceiptManager<U: UnitOfWork> {
    uow: Arc<U>,
    audit: Arc<dyn AuditRecorder>,
    max_receipt_bytes: usize,
}

impl<U: UnitOfWork> ReceiptManager<U> {
    pub fn new(uow: Arc<U>, audit: Arc<dyn AuditRecorder>, max_receipt_bytes: usize) -> Self {
        Self {
            uow,
            audit,
            max_receipt_bytes,
        }
    }
}

#[async_trait]
impl<U: UnitOfWork> ReceiptService for ReceiptManager<U> {
    async fn attach_receipt(
        &self,
        actor: &Actor,
        target: Option<&str>,
        expense_id: Uuid,
        file: ReceiptFile,
    ) -> AppResult<Receipt> {
        file.validate("receipt", self.max_receipt_bytes).into_result()?;

        let scope = scope::resolve(self.uow.users().as_ref(), actor, target).await?;
        let expense = self
            .uow
            .expenses()
            .find_by_id(expense_id)
            .await?
            .ok_or_not_found("Expense")?;
        scope.ensure_owner(&expense.username)?;

        let receipt = self
            .uow
            .receipts()
            .upsert_for_expense(NewReceipt::new(
                expense.id,
                &expense.username,
                &expense.category,
                file,
            ))
            .await?;

        tracing::info!(receipt_id = %receipt.id, expense_id = %expense.id, "Receipt attached");
        self.audit.record(
            NewAuditLog::new(&actor.username, AUDIT_ACTION_UPDATE, "Receipt")
                .entity_id(receipt.id)
                .details(format!("expense: {}", expense.id)),
        );
        Ok(receipt)
    }

    async fn delete_receipt(
        &self,
        actor: &Actor,
        target: Option<&str>,
        receipt_id: Uuid,
    ) -> AppResult<()> {
        let scope = scope::resolve(self.uow.users().as_ref(), actor, target).await?;
        let content = self
            .uow
            .receipts()
            .find_by_id(receipt_id)
            .await?
            .ok_or_not_found("Receipt")?;
        scope.ensure_owner(&content.receipt.username)?;

        self.uow.receipts().delete(receipt_id).await?;

        self.audit.record(
            NewAuditLog::new(&actor.username, AUDIT_ACTION_DELETE, "Receipt").entity_id(receipt_id),
        );
        Ok(())
    }

    async fn list_receipts(&self, actor: &Actor, target: Option<&str>) -> AppResult<Vec<Receipt>> {
        let scope = scope::resolve(self.uow.users().as_ref(), actor, target).await?;
        self.uow.receipts().find_by_owner(&scope.target).await
    }
}
