//! Migration: Create expenses table.

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_users_table::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Expenses::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Expenses::Username).string_len(255).not_null())
                    .col(ColumnDef::new(Expenses::Title).string_len(100).not_null())
                    .col(ColumnDef::new(Expenses::Category).string_len(50).not_null())
                    .col(ColumnDef::new(Expenses::Notes).string_len(500).null())
                    .col(ColumnDef::new(Expenses::Amount).decimal_len(18, 2).not_null())
                    .col(
                        ColumnDef::new(Expenses::ExpenseDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Expenses::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Expenses::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Expenses::CreatedBy).string_len(255).not_null())
                    .col(ColumnDef::new(Expenses::UpdatedBy).string_len(255).null())
                    .col(
                        ColumnDef::new(Expenses::Version)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expenses_username")
                            .from(Expenses::Table, Expenses::Username)
                            .to(Users::Table, Users::Username)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Scoped listings and date-range reports
        manager
            .create_index(
                Index::create()
                    .name("idx_expenses_username_expense_date")
                    .table(Expenses::Table)
                    .col(Expenses::Username)
                    .col(Expenses::ExpenseDate)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub(super) enum Expenses {
    Table,
    Id,
    Username,
    Title,
    Category,
    Notes,
    Amount,
    ExpenseDate,
    CreatedAt,
    UpdatedAt,
    CreatedBy,
    UpdatedBy,
    Version,
}
