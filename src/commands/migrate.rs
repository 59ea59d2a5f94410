//! Migrate command - Schema management for the users, expenses, receipts
//! and audit log tables.

use crate::cli::args::{MigrateAction, MigrateArgs};
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::Database;

/// Execute the migrate command
pub async fn execute(args: MigrateArgs, config: Config) -> AppResult<()> {
    if let MigrateAction::Fresh { yes: false } = args.action {
        return Err(AppError::validation(
            "migrate fresh erases every user, expense, receipt and audit entry; rerun with --yes",
        ));
    }

    // Migrations are driven manually here, never on connect
    let db = super::connect(&config, false).await?;

    match args.action {
        MigrateAction::Up => {
            let pending = pending(&status(&db).await?);
            if pending.is_empty() {
                tracing::info!("Schema is up to date");
                return Ok(());
            }
            db.run_migrations().await?;
            for name in pending {
                tracing::info!(migration = %name, "Applied");
            }
        }
        MigrateAction::Down => {
            let last = status(&db)
                .await?
                .into_iter()
                .rev()
                .find(|(_, applied)| *applied)
                .map(|(name, _)| name);
            let Some(last) = last else {
                tracing::info!("No applied migrations to roll back");
                return Ok(());
            };
            db.rollback_migration().await?;
            tracing::info!(migration = %last, "Rolled back");
        }
        MigrateAction::Status => {
            print!("{}", status_report(&status(&db).await?));
        }
        MigrateAction::Fresh { .. } => {
            tracing::warn!("Dropping all tables and re-running every migration");
            db.fresh_migrations().await?;
            tracing::info!("Schema rebuilt");
        }
    }

    Ok(())
}

async fn status(db: &Database) -> AppResult<Vec<(String, bool)>> {
    Ok(db.migration_status().await?)
}

/// Names of migrations not yet applied, in run order.
fn pending(status: &[(String, bool)]) -> Vec<String> {
    status
        .iter()
        .filter(|(_, applied)| !applied)
        .map(|(name, _)| name.clone())
        .collect()
}

/// One aligned line per migration followed by a totals line.
fn status_report(status: &[(String, bool)]) -> String {
    let width = status.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    let applied = status.iter().filter(|(_, applied)| *applied).count();

    let mut report = String::new();
    for (name, is_applied) in status {
        let state = if *is_applied { "applied" } else { "pending" };
        report.push_str(&format!("{:<width$}  {}\n", name, state, width = width));
    }
    report.push_str(&format!(
        "{} applied, {} pending\n",
        applied,
        status.len() - applied
    ));
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<(String, bool)> {
        vec![
            ("m20240101_000001_create_users_table".to_string(), true),
            ("m20240101_000002_create_expenses_table".to_string(), true),
            ("m20240101_000003_create_receipts_table".to_string(), false),
        ]
    }

    #[test]
    fn test_pending_keeps_run_order() {
        assert_eq!(pending(&sample()), vec!["m20240101_000003_create_receipts_table"]);
        assert!(pending(&[]).is_empty());
    }

    #[test]
    fn test_status_report_aligns_and_counts() {
        let report = status_report(&sample());
        let lines: Vec<&str> = report.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "m20240101_000001_create_users_table     applied");
        assert_eq!(lines[2], "m20240101_000003_create_receipts_table  pending");
        assert_eq!(lines[3], "2 applied, 1 pending");
    }

    #[tokio::test]
    async fn test_fresh_requires_confirmation() {
        let args = MigrateArgs {
            action: MigrateAction::Fresh { yes: false },
        };
        let config = Config::new(
            "postgres://unused@localhost/unused",
            "test-secret-key-that-is-at-least-32-chars",
        );

        let result = execute(args, config).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
