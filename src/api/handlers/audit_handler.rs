//! Audit history handler.

use axum::{extract::State, response::Json, routing::get, Extension, Router};

use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::AuditLog;
use crate::errors::AppResult;

/// Create audit routes
pub fn audit_routes() -> Router<AppState> {
    Router::new().route("/", get(list_audit_logs))
}

/// Full audit history, newest first (admin only)
#[utoipa::path(
    get,
    path = "/api/audit",
    tag = "Audit",
    responses(
        (status = 200, description = "Audit entries", body = Vec<AuditLog>),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_audit_logs(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<AuditLog>>> {
    let logs = state
        .audit_service
        .list_audit_logs(&current_user.actor())
        .await?;

    Ok(Json(logs))
}
