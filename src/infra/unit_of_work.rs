//! Unit of Work pattern implementation.
//!
//! Centralizes access to all repositories behind one trait so services can
//! be built over the real stores or over in-memory fakes. Multi-row writes
//! that must be atomic are transactional inside the store that performs them.

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use super::repositories::{
    AuditRepository, AuditStore, ExpenseRepository, ExpenseStore, ReceiptRepository,
    ReceiptStore, UserRepository, UserStore,
};

/// Unit of Work trait for dependency injection.
pub trait UnitOfWork: Send + Sync + 'static {
    fn users(&self) -> Arc<dyn UserRepository>;

    fn expenses(&self) -> Arc<dyn ExpenseRepository>;

    fn receipts(&self) -> Arc<dyn ReceiptRepository>;

    fn audit_logs(&self) -> Arc<dyn AuditRepository>;
}

/// Concrete implementation of UnitOfWork over one connection pool
pub struct Persistence {
    user_repo: Arc<UserStore>,
    expense_repo: Arc<ExpenseStore>,
    receipt_repo: Arc<ReceiptStore>,
    audit_repo: Arc<AuditStore>,
}

impl Persistence {
    /// Create new UnitOfWork instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            user_repo: Arc::new(UserStore::new(db.clone())),
            expense_repo: Arc::new(ExpenseStore::new(db.clone())),
            receipt_repo: Arc::new(ReceiptStore::new(db.clone())),
            audit_repo: Arc::new(AuditStore::new(db)),
        }
    }
}

impl UnitOfWork for Persistence {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.user_repo.clone()
    }

    fn expenses(&self) -> Arc<dyn ExpenseRepository> {
        self.expense_repo.clone()
    }

    fn receipts(&self) -> Arc<dyn ReceiptRepository> {
        self.receipt_repo.clone()
    }

    fn audit_logs(&self) -> Arc<dyn AuditRepository> {
        self.audit_repo.clone()
    }
}
