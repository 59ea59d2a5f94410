//! Expense repository.
//!
//! Expenses are returned with their receipt metadata attached. Writes that
//! touch a receipt run in one transaction with the expense write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Select, Set,
};
use uuid::Uuid;

use super::entities::expense::{self, ActiveModel, Entity as ExpenseEntity, Model};
use super::receipt_repository::{metadata_for_expenses, replace_for_expense};
use super::transaction;
use crate::domain::{Expense, NewExpense, NewReceipt, Range};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::types::page_offset;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ExpenseRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Expense>>;

    /// Expenses of one owner, optionally bounded by expense date
    async fn find_by_owner(
        &self,
        username: &str,
        date: Option<crate::domain::Range<DateTime<Utc>>>,
    ) -> AppResult<Vec<Expense>>;

    /// Every expense in the system
    async fn find_all(&self) -> AppResult<Vec<Expense>>;

    /// One page (1-indexed) of an owner's expenses, newest first, with the
    /// owner's total count
    async fn find_page_by_owner(
        &self,
        username: &str,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<Expense>, u64)>;

    /// Insert an expense and its optional receipt atomically
    async fn create(&self, expense: NewExpense, receipt: Option<NewReceipt>) -> AppResult<Expense>;

    /// Write `expense` only if the stored version still equals
    /// `expected_version`; bumps the version. Fails with `StaleEntity`
    /// otherwise. A supplied receipt replaces the current one in the same
    /// transaction.
    async fn update(
        &self,
        expense: &Expense,
        expected_version: i32,
        receipt: Option<NewReceipt>,
    ) -> AppResult<Expense>;

    /// Hard delete; the receipt goes with it
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

pub struct ExpenseStore {
    db: DatabaseConnection,
}

impl ExpenseStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn load<C: ConnectionTrait>(conn: &C, query: Select<ExpenseEntity>) -> AppResult<Vec<Expense>> {
        let models = query.all(conn).await?;
        attach_receipts(conn, models).await
    }
}

async fn attach_receipts<C: ConnectionTrait>(conn: &C, models: Vec<Model>) -> AppResult<Vec<Expense>> {
    let ids = models.iter().map(|m| m.id).collect();
    let mut receipts = metadata_for_expenses(conn, ids).await?;

    Ok(models
        .into_iter()
        .map(|model| {
            let receipt = receipts.remove(&model.id);
            model.into_expense(receipt)
        })
        .collect())
}

async fn insert<C: ConnectionTrait>(
    conn: &C,
    expense: NewExpense,
    receipt: Option<NewReceipt>,
) -> AppResult<Expense> {
    let model = ActiveModel {
        id: Set(expense.id),
        username: Set(expense.username),
        title: Set(expense.title),
        category: Set(expense.category),
        notes: Set(expense.notes),
        amount: Set(expense.amount),
        expense_date: Set(expense.expense_date),
        created_at: Set(expense.created_at),
        updated_at: Set(expense.created_at),
        created_by: Set(expense.created_by),
        updated_by: Set(None),
        version: Set(1),
    }
    .insert(conn)
    .await?;

    let receipt = match receipt {
        Some(new) => Some(replace_for_expense(conn, new).await?),
        None => None,
    };
    Ok(model.into_expense(receipt))
}

async fn conditional_update<C: ConnectionTrait>(
    conn: &C,
    expense: &Expense,
    expected_version: i32,
    receipt: Option<NewReceipt>,
) -> AppResult<()> {
    let result = ExpenseEntity::update_many()
        .col_expr(expense::Column::Title, Expr::value(expense.title.clone()))
        .col_expr(expense::Column::Category, Expr::value(expense.category.clone()))
        .col_expr(expense::Column::Notes, Expr::value(expense.notes.clone()))
        .col_expr(expense::Column::Amount, Expr::value(expense.amount))
        .col_expr(expense::Column::ExpenseDate, Expr::value(expense.expense_date))
        .col_expr(expense::Column::UpdatedAt, Expr::value(expense.updated_at))
        .col_expr(expense::Column::UpdatedBy, Expr::value(expense.updated_by.clone()))
        .col_expr(expense::Column::Version, Expr::value(expected_version + 1))
        .filter(expense::Column::Id.eq(expense.id))
        .filter(expense::Column::Version.eq(expected_version))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::StaleEntity("Expense"));
    }

    if let Some(new) = receipt {
        replace_for_expense(conn, new).await?;
    }
    Ok(())
}

#[async_trait]
impl ExpenseRepository for ExpenseStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Expense>> {
        let found = Self::load(&self.db, ExpenseEntity::find_by_id(id)).await?;
        Ok(found.into_iter().next())
    }

    async fn find_by_owner(
        &self,
        username: &str,
        date: Option<Range<DateTime<Utc>>>,
    ) -> AppResult<Vec<Expense>> {
        let mut query = ExpenseEntity::find().filter(expense::Column::Username.eq(username));
        if let Some(range) = date {
            if let Some(min) = range.min {
                query = query.filter(expense::Column::ExpenseDate.gte(min));
            }
            if let Some(max) = range.max {
                query = query.filter(expense::Column::ExpenseDate.lte(max));
            }
        }
        let query = query.order_by_desc(expense::Column::ExpenseDate);

        Self::load(&self.db, query).await
    }

    async fn find_all(&self) -> AppResult<Vec<Expense>> {
        let query = ExpenseEntity::find().order_by_desc(expense::Column::ExpenseDate);
        Self::load(&self.db, query).await
    }

    async fn find_page_by_owner(
        &self,
        username: &str,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<Expense>, u64)> {
        let paginator = ExpenseEntity::find()
            .filter(expense::Column::Username.eq(username))
            .order_by_desc(expense::Column::CreatedAt)
            .order_by_asc(expense::Column::Id)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let in_range = page_offset(page, per_page).is_some_and(|offset| offset < total);
        if !in_range {
            return Ok((Vec::new(), total));
        }

        let models = paginator.fetch_page(page - 1).await?;
        let expenses = attach_receipts(&self.db, models).await?;

        Ok((expenses, total))
    }

    async fn create(&self, expense: NewExpense, receipt: Option<NewReceipt>) -> AppResult<Expense> {
        let txn = transaction::begin(&self.db).await?;
        let result = insert(&txn, expense, receipt).await;
        transaction::finish(txn, result).await
    }

    async fn update(
        &self,
        expense: &Expense,
        expected_version: i32,
        receipt: Option<NewReceipt>,
    ) -> AppResult<Expense> {
        let txn = transaction::begin(&self.db).await?;
        let result = conditional_update(&txn, expense, expected_version, receipt).await;
        transaction::finish(txn, result).await?;

        self.find_by_id(expense.id).await?.ok_or_not_found("Expense")
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = ExpenseEntity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::EntityNotFound("Expense"));
        }
        Ok(())
    }
}
