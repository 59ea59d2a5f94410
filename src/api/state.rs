//! Application state - Dependency injection container.
//!
//! Provides centralized access to all application services and infrastructure.

use std::sync::Arc;

use crate::config::Config;
use crate::infra::Database;
use crate::services::{
    AuditService, AuthService, ExpenseService, ReceiptService, ReportService, ServiceContainer,
    Services, UserService,
};

/// Application state containing all services (DI container).
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthService>,
    pub user_service: Arc<dyn UserService>,
    pub expense_service: Arc<dyn ExpenseService>,
    pub receipt_service: Arc<dyn ReceiptService>,
    pub report_service: Arc<dyn ReportService>,
    pub audit_service: Arc<dyn AuditService>,
    /// Database connection (health checks)
    pub database: Arc<Database>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Create application state from database connection and config.
    pub fn from_config(database: Arc<Database>, config: Config) -> Self {
        let services = Services::from_connection(database.get_connection(), config.clone());
        Self::from_services(&services, database, config)
    }

    /// Create application state from an already-built service container.
    pub fn from_services(
        services: &dyn ServiceContainer,
        database: Arc<Database>,
        config: Config,
    ) -> Self {
        Self {
            auth_service: services.auth(),
            user_service: services.users(),
            expense_service: services.expenses(),
            receipt_service: services.receipts(),
            report_service: services.reports(),
            audit_service: services.audit(),
            database,
            config: Arc::new(config),
        }
    }
}
