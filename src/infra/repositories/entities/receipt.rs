//! Receipt database entity for SeaORM.

use sea_orm::entity::prelude::*;
use sea_orm::FromQueryResult;

use crate::domain::{Receipt, ReceiptContent};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "receipts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub expense_id: Uuid,
    pub username: String,
    pub name: String,
    pub category: String,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub data: Vec<u8>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::expense::Entity",
        from = "Column::ExpenseId",
        to = "super::expense::Column::Id",
        on_delete = "Cascade"
    )]
    Expense,
}

impl Related<super::expense::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expense.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Receipt row without the stored bytes.
#[derive(Debug, Clone, FromQueryResult)]
pub struct Metadata {
    pub id: Uuid,
    pub expense_id: Uuid,
    pub username: String,
    pub name: String,
    pub category: String,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl From<Metadata> for Receipt {
    fn from(row: Metadata) -> Self {
        Receipt {
            id: row.id,
            expense_id: row.expense_id,
            username: row.username,
            name: row.name,
            category: row.category,
            file_name: row.file_name,
            content_type: row.content_type,
            size_bytes: row.size_bytes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<Model> for ReceiptContent {
    fn from(model: Model) -> Self {
        ReceiptContent {
            receipt: Receipt {
                id: model.id,
                expense_id: model.expense_id,
                username: model.username,
                name: model.name,
                category: model.category,
                file_name: model.file_name,
                content_type: model.content_type,
                size_bytes: model.size_bytes,
                created_at: model.created_at,
                updated_at: model.updated_at,
            },
            data: model.data,
        }
    }
}
