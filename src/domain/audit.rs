//! Audit log entries.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Immutable record of an action taken by a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub id: Uuid,
    /// Acting user
    #[schema(example = "admin@example.com")]
    pub username: String,
    #[schema(example = "create")]
    pub action: String,
    #[schema(example = "Expense")]
    pub entity_name: String,
    pub entity_id: Option<String>,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An audit entry waiting to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuditLog {
    pub id: Uuid,
    pub username: String,
    pub action: String,
    pub entity_name: String,
    pub entity_id: Option<String>,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewAuditLog {
    pub fn new(username: &str, action: &str, entity_name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.to_string(),
            action: action.to_string(),
            entity_name: entity_name.to_string(),
            entity_id: None,
            details: None,
            created_at: Utc::now(),
        }
    }

    pub fn entity_id(mut self, id: impl ToString) -> Self {
        self.entity_id = Some(id.to_string());
        self
    }

    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl From<NewAuditLog> for AuditLog {
    fn from(entry: NewAuditLog) -> Self {
        Self {
            id: entry.id,
            username: entry.username,
            action: entry.action,
            entity_name: entry.entity_name,
            entity_id: entry.entity_id,
            details: entry.details,
            created_at: entry.created_at,
        }
    }
}
