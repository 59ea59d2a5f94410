//! Receipt repository. Bytes are only loaded when a single receipt is fetched.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set,
};
use uuid::Uuid;

use super::entities::receipt::{self, ActiveModel, Entity as ReceiptEntity, Metadata};
use super::transaction;
use crate::domain::{NewReceipt, Receipt, ReceiptContent};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ReceiptRepository: Send + Sync {
    /// Receipt metadata and bytes
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<ReceiptContent>>;

    /// Metadata of every receipt owned by `username`, newest first
    async fn find_by_owner(&self, username: &str) -> AppResult<Vec<Receipt>>;

    /// Create the receipt of an expense, replacing any existing one
    async fn upsert_for_expense(&self, receipt: NewReceipt) -> AppResult<Receipt>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

pub struct ReceiptStore {
    db: DatabaseConnection,
}

impl ReceiptStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Select receipt columns except the stored bytes.
pub(super) fn metadata_query() -> Select<ReceiptEntity> {
    ReceiptEntity::find().select_only().columns([
        receipt::Column::Id,
        receipt::Column::ExpenseId,
        receipt::Column::Username,
        receipt::Column::Name,
        receipt::Column::Category,
        receipt::Column::FileName,
        receipt::Column::ContentType,
        receipt::Column::SizeBytes,
        receipt::Column::CreatedAt,
        receipt::Column::UpdatedAt,
    ])
}

/// Receipt metadata keyed by expense id.
pub(super) async fn metadata_for_expenses<C: ConnectionTrait>(
    conn: &C,
    expense_ids: Vec<Uuid>,
) -> AppResult<HashMap<Uuid, Receipt>> {
    if expense_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = metadata_query()
        .filter(receipt::Column::ExpenseId.is_in(expense_ids))
        .into_model::<Metadata>()
        .all(conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| (row.expense_id, Receipt::from(row)))
        .collect())
}

/// Delete the current receipt of the expense (if any) and insert `new`.
pub(super) async fn replace_for_expense<C: ConnectionTrait>(
    conn: &C,
    new: NewReceipt,
) -> AppResult<Receipt> {
    ReceiptEntity::delete_many()
        .filter(receipt::Column::ExpenseId.eq(new.expense_id))
        .exec(conn)
        .await?;

    let now = Utc::now();
    let content_type = new.file.content_type().to_string();
    let size_bytes = new.file.size_bytes();
    let model = ActiveModel {
        id: Set(new.id),
        expense_id: Set(new.expense_id),
        username: Set(new.username),
        name: Set(new.file.file_name.clone()),
        category: Set(new.category),
        file_name: Set(new.file.file_name),
        content_type: Set(content_type),
        size_bytes: Set(size_bytes),
        data: Set(new.file.data),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await?;

    Ok(ReceiptContent::from(model).receipt)
}

#[async_trait]
impl ReceiptRepository for ReceiptStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<ReceiptContent>> {
        let model = ReceiptEntity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(ReceiptContent::from))
    }

    async fn find_by_owner(&self, username: &str) -> AppResult<Vec<Receipt>> {
        let rows = metadata_query()
            .filter(receipt::Column::Username.eq(username))
            .order_by_desc(receipt::Column::CreatedAt)
            .into_model::<Metadata>()
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(Receipt::from).collect())
    }

    async fn upsert_for_expense(&self, receipt: NewReceipt) -> AppResult<Receipt> {
        let txn = transaction::begin(&self.db).await?;
        let result = replace_for_expense(&txn, receipt).await;
        transaction::finish(txn, result).await
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = ReceiptEntity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::EntityNotFound("Receipt"));
        }
        Ok(())
    }
}
