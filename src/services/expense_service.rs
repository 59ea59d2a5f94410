//! Expense service - Expense lifecycle use cases.
//!
//! Every operation resolves the effective target user through the access
//! policy first, then confines itself to that user's expenses.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use super::audit_service::AuditRecorder;
use super::scope;
use crate::config::{
    AUDIT_ACTION_CREATE, AUDIT_ACTION_DELETE, AUDIT_ACTION_UPDATE, MAX_PAGE_SIZE,
};
use crate::domain::{
    Actor, CreateExpense, Expense, ExpensePatch, ExpenseSearch, NewAuditLog, NewExpense,
    NewReceipt, ReceiptContent, Scope,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;
use crate::types::Paginated;

const ENTITY: &str = "Expense";

#[async_trait]
pub trait ExpenseService: Send + Sync {
    /// Record an expense for the effective target
    async fn add_expense(
        &self,
        actor: &Actor,
        target: Option<&str>,
        input: CreateExpense,
    ) -> AppResult<Expense>;

    /// Apply a partial update
    async fn update_expense(
        &self,
        actor: &Actor,
        target: Option<&str>,
        patch: ExpensePatch,
    ) -> AppResult<Expense>;

    /// Delete an expense and its receipt; returns what was deleted
    async fn delete_expense(&self, actor: &Actor, target: Option<&str>, id: Uuid)
        -> AppResult<Expense>;

    async fn get_expense(&self, actor: &Actor, target: Option<&str>, id: Uuid) -> AppResult<Expense>;

    /// Search across every user's expenses (admin only)
    async fn search_expenses(&self, actor: &Actor, search: ExpenseSearch) -> AppResult<Vec<Expense>>;

    /// Search within the effective target's expenses
    async fn search_user_expenses(
        &self,
        actor: &Actor,
        target: Option<&str>,
        search: ExpenseSearch,
    ) -> AppResult<Vec<Expense>>;

    /// 1-indexed page of the target's expenses, newest first
    async fn get_expenses_by_username(
        &self,
        actor: &Actor,
        target: Option<&str>,
        page: u64,
        page_size: u64,
    ) -> AppResult<Paginated<Expense>>;

    /// Stored receipt file
    async fn get_expense_receipt(
        &self,
        actor: &Actor,
        target: Option<&str>,
        receipt_id: Uuid,
    ) -> AppResult<ReceiptContent>;
}

pub struct ExpenseManager<U: UnitOfWork> {
    uow: Arc<U>,
    audit: Arc<dyn AuditRecorder>,
    max_receipt_bytes: usize,
}

impl<U: UnitOfWork> ExpenseManager<U> {
    pub fn new(uow: Arc<U>, audit: Arc<dyn AuditRecorder>, max_receipt_bytes: usize) -> Self {
        Self {
            uow,
            audit,
            max_receipt_bytes,
        }
    }

    async fn scope(&self, actor: &Actor, target: Option<&str>) -> AppResult<Scope> {
        scope::resolve(self.uow.users().as_ref(), actor, target).await
    }

    async fn load(&self, id: Uuid) -> AppResult<Expense> {
        self.uow.expenses().find_by_id(id).await?.ok_or_not_found(ENTITY)
    }

    fn audit(&self, actor: &Actor, action: &str, expense: &Expense) {
        let mut entry = NewAuditLog::new(&actor.username, action, ENTITY).entity_id(expense.id);
        if expense.username != actor.username {
            entry = entry.details(format!("owner: {}", expense.username));
        }
        self.audit.record(entry);
    }
}

#[async_trait]
impl<U: UnitOfWork> ExpenseService for ExpenseManager<U> {
    async fn add_expense(
        &self,
        actor: &Actor,
        target: Option<&str>,
        input: CreateExpense,
    ) -> AppResult<Expense> {
        let now = Utc::now();
        input.validate(now, self.max_receipt_bytes)?;

        let scope = actor.scope(target)?;
        if self.uow.users().find_by_username(&scope.target).await?.is_none() {
            return Err(AppError::entity_creation(format!(
                "User {} does not exist",
                scope.target
            )));
        }

        let row = NewExpense::new(&input, &scope.target, &actor.username, now);
        let receipt = input
            .receipt
            .map(|file| NewReceipt::new(row.id, &scope.target, &row.category, file));

        let expense = self.uow.expenses().create(row, receipt).await?;

        tracing::info!(
            expense_id = %expense.id,
            owner = %expense.username,
            actor = %actor.username,
            "Expense created"
        );
        self.audit(actor, AUDIT_ACTION_CREATE, &expense);
        Ok(expense)
    }

    async fn update_expense(
        &self,
        actor: &Actor,
        target: Option<&str>,
        patch: ExpensePatch,
    ) -> AppResult<Expense> {
        let now = Utc::now();
        patch.validate(now, self.max_receipt_bytes)?;

        let scope = self.scope(actor, target).await?;
        let mut expense = self.load(patch.id).await?;
        if scope.ensure_owner(&expense.username).is_err() {
            tracing::warn!(
                expense_id = %expense.id,
                actor = %actor.username,
                "Rejected update of another user's expense"
            );
            return Err(AppError::entity_update(
                "You are not allowed to update this expense",
            ));
        }
        if patch.version.is_some_and(|seen| seen != expense.version) {
            return Err(AppError::StaleEntity(ENTITY));
        }

        let expected_version = expense.version;
        expense.apply(&patch, &actor.username, now);
        let receipt = patch
            .receipt
            .map(|file| NewReceipt::new(expense.id, &expense.username, &expense.category, file));

        let updated = self
            .uow
            .expenses()
            .update(&expense, expected_version, receipt)
            .await?;

        tracing::info!(expense_id = %updated.id, version = updated.version, "Expense updated");
        self.audit(actor, AUDIT_ACTION_UPDATE, &updated);
        Ok(updated)
    }

    async fn delete_expense(
        &self,
        actor: &Actor,
        target: Option<&str>,
        id: Uuid,
    ) -> AppResult<Expense> {
        let scope = self.scope(actor, target).await?;
        let expense = self.load(id).await?;
        scope.ensure_owner(&expense.username)?;

        self.uow.expenses().delete(id).await?;

        tracing::info!(expense_id = %id, actor = %actor.username, "Expense deleted");
        self.audit(actor, AUDIT_ACTION_DELETE, &expense);
        Ok(expense)
    }

    async fn get_expense(&self, actor: &Actor, target: Option<&str>, id: Uuid) -> AppResult<Expense> {
        let scope = self.scope(actor, target).await?;
        let expense = self.load(id).await?;
        scope.ensure_owner(&expense.username)?;
        Ok(expense)
    }

    async fn search_expenses(&self, actor: &Actor, search: ExpenseSearch) -> AppResult<Vec<Expense>> {
        actor.require_admin()?;
        let all = self.uow.expenses().find_all().await?;
        Ok(search.apply(all))
    }

    async fn search_user_expenses(
        &self,
        actor: &Actor,
        target: Option<&str>,
        search: ExpenseSearch,
    ) -> AppResult<Vec<Expense>> {
        let scope = self.scope(actor, target).await?;
        let owned = self
            .uow
            .expenses()
            .find_by_owner(&scope.target, search.date)
            .await?;
        Ok(search.apply(owned))
    }

    async fn get_expenses_by_username(
        &self,
        actor: &Actor,
        target: Option<&str>,
        page: u64,
        page_size: u64,
    ) -> AppResult<Paginated<Expense>> {
        if page == 0 {
            return Err(AppError::field("page", "Page must be at least 1"));
        }
        if page_size == 0 {
            return Err(AppError::field("perPage", "Page size must be at least 1"));
        }
        let per_page = page_size.min(MAX_PAGE_SIZE);

        let scope = self.scope(actor, target).await?;
        let (items, total) = self
            .uow
            .expenses()
            .find_page_by_owner(&scope.target, page, per_page)
            .await?;

        Ok(Paginated::new(items, page, per_page, total))
    }

    async fn get_expense_receipt(
        &self,
        actor: &Actor,
        target: Option<&str>,
        receipt_id: Uuid,
    ) -> AppResult<ReceiptContent> {
        let scope = self.scope(actor, target).await?;
        let content = self
            .uow
            .receipts()
            .find_by_id(receipt_id)
            .await?
            .ok_or_not_found("Receipt")?;
        scope.ensure_owner(&content.receipt.username)?;
        Ok(content)
    }
}
