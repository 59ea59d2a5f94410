//! Scope resolution shared by the expense, receipt and report services.

use crate::domain::{Actor, Scope};
use crate::errors::{AppError, AppResult};
use crate::infra::UserRepository;

/// Resolve the effective target and, when an admin acts for someone else,
/// make sure that user exists and is active.
pub(crate) async fn resolve(
    users: &dyn UserRepository,
    actor: &Actor,
    requested: Option<&str>,
) -> AppResult<Scope> {
    let scope = actor.scope(requested)?;
    if scope.elevated && users.find_by_username(&scope.target).await?.is_none() {
        return Err(AppError::EntityNotFound("User"));
    }
    Ok(scope)
}
