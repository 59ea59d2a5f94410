//! Transaction helpers shared by stores that write more than one row.

use sea_orm::{AccessMode, DatabaseConnection, DatabaseTransaction, IsolationLevel, TransactionTrait};

use crate::errors::AppResult;

/// Begin a read-committed read/write transaction.
pub(super) async fn begin(db: &DatabaseConnection) -> AppResult<DatabaseTransaction> {
    let txn = db
        .begin_with_config(Some(IsolationLevel::ReadCommitted), Some(AccessMode::ReadWrite))
        .await?;
    Ok(txn)
}

/// Commit on success, roll back on error.
pub(super) async fn finish<T>(txn: DatabaseTransaction, result: AppResult<T>) -> AppResult<T> {
    match result {
        Ok(value) => {
            txn.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::error!("Transaction rollback failed: {}", rollback_err);
            }
            Err(e)
        }
    }
}
