//! Migration: Create receipts table.

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_users_table::Users;
use super::m20240101_000002_create_expenses_table::Expenses;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Receipts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Receipts::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Receipts::ExpenseId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Receipts::Username).string_len(255).not_null())
                    .col(ColumnDef::new(Receipts::Name).string().not_null())
                    .col(ColumnDef::new(Receipts::Category).string_len(50).not_null())
                    .col(ColumnDef::new(Receipts::FileName).string().not_null())
                    .col(ColumnDef::new(Receipts::ContentType).string_len(100).not_null())
                    .col(ColumnDef::new(Receipts::SizeBytes).big_integer().not_null())
                    .col(ColumnDef::new(Receipts::Data).binary().not_null())
                    .col(
                        ColumnDef::new(Receipts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Receipts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_receipts_expense_id")
                            .from(Receipts::Table, Receipts::ExpenseId)
                            .to(Expenses::Table, Expenses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_receipts_username")
                            .from(Receipts::Table, Receipts::Username)
                            .to(Users::Table, Users::Username)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Receipts::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Receipts {
    Table,
    Id,
    ExpenseId,
    Username,
    Name,
    Category,
    FileName,
    ContentType,
    SizeBytes,
    Data,
    CreatedAt,
    UpdatedAt,
}
