//! Service Container - Centralized service access.
//!
//! Builds every service over one Unit of Work and one audit trail.

use std::sync::Arc;

use super::{
    AuditManager, AuditRecorder, AuditService, AuditTrail, AuthService, Authenticator,
    ExpenseManager, ExpenseService, ReceiptManager, ReceiptService, ReportManager, ReportService,
    UserManager, UserService,
};
use crate::config::Config;
use crate::infra::{Persistence, UnitOfWork};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Service container trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait ServiceContainer: Send + Sync {
    fn auth(&self) -> Arc<dyn AuthService>;

    fn users(&self) -> Arc<dyn UserService>;

    fn expenses(&self) -> Arc<dyn ExpenseService>;

    fn receipts(&self) -> Arc<dyn ReceiptService>;

    fn reports(&self) -> Arc<dyn ReportService>;

    fn audit(&self) -> Arc<dyn AuditService>;
}

/// Concrete implementation of ServiceContainer
#[derive(Clone)]
pub struct Services {
    auth_service: Arc<dyn AuthService>,
    user_service: Arc<dyn UserService>,
    expense_service: Arc<dyn ExpenseService>,
    receipt_service: Arc<dyn ReceiptService>,
    report_service: Arc<dyn ReportService>,
    audit_service: Arc<dyn AuditService>,
}

impl Services {
    /// Create service container from database connection and config.
    ///
    /// Spawns the audit writer, so this must run inside a tokio runtime.
    pub fn from_connection(db: sea_orm::DatabaseConnection, config: Config) -> Self {
        Self::from_unit_of_work(Arc::new(Persistence::new(db)), config)
    }

    /// Create every service over `uow`.
    pub fn from_unit_of_work<U: UnitOfWork>(uow: Arc<U>, config: Config) -> Self {
        let (trail, _writer) = AuditTrail::spawn(uow.audit_logs());
        let recorder: Arc<dyn AuditRecorder> = Arc::new(trail);
        Self::with_recorder(uow, recorder, config)
    }

    /// Create every service over `uow`, sending audit entries to `recorder`.
    pub fn with_recorder<U: UnitOfWork>(
        uow: Arc<U>,
        recorder: Arc<dyn AuditRecorder>,
        config: Config,
    ) -> Self {
        let max_receipt_bytes = config.max_receipt_bytes;

        Self {
            auth_service: Arc::new(Authenticator::new(uow.clone(), recorder.clone(), config)),
            user_service: Arc::new(UserManager::new(uow.clone(), recorder.clone())),
            expense_service: Arc::new(ExpenseManager::new(
                uow.clone(),
                recorder.clone(),
                max_receipt_bytes,
            )),
            receipt_service: Arc::new(ReceiptManager::new(
                uow.clone(),
                recorder,
                max_receipt_bytes,
            )),
            report_service: Arc::new(ReportManager::new(uow.clone())),
            audit_service: Arc::new(AuditManager::new(uow)),
        }
    }
}

impl ServiceContainer for Services {
    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth_service.clone()
    }

    fn users(&self) -> Arc<dyn UserService> {
        self.user_service.clone()
    }

    fn expenses(&self) -> Arc<dyn ExpenseService> {
        self.expense_service.clone()
    }

    fn receipts(&self) -> Arc<dyn ReceiptService> {
        self.receipt_service.clone()
    }

    fn reports(&self) -> Arc<dyn ReportService> {
        self.report_service.clone()
    }

    fn audit(&self) -> Arc<dyn AuditService> {
        self.audit_service.clone()
    }
}
