//! CLI argument definitions.
//!
//! Uses clap derive macros for type-safe argument parsing.

use clap::{Parser, Subcommand};

/// Expense Tracker - expense records, receipts and spending reports
#[derive(Parser, Debug)]
#[command(name = "expense-tracker")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve(ServeArgs),

    /// Run database migrations
    Migrate(MigrateArgs),

    /// Administrative account management
    Admin(AdminArgs),
}

/// Arguments for the serve command. Unset values fall back to the
/// `SERVER_HOST`/`SERVER_PORT` configuration.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Host to bind to
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Arguments for the migrate command
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    #[command(subcommand)]
    pub action: MigrateAction,
}

/// Migration actions
#[derive(Subcommand, Debug)]
pub enum MigrateAction {
    /// Run pending migrations
    Up,
    /// Rollback last migration
    Down,
    /// Show migration status
    Status,
    /// Drop every table and re-run all migrations
    Fresh {
        /// Confirm that all users, expenses, receipts and audit history are erased
        #[arg(long)]
        yes: bool,
    },
}

/// Arguments for the admin command
#[derive(Parser, Debug)]
pub struct AdminArgs {
    #[command(subcommand)]
    pub action: AdminAction,
}

/// Admin account actions
#[derive(Subcommand, Debug)]
pub enum AdminAction {
    /// Create an administrator account
    Create {
        /// Username (email address)
        username: String,
        /// Password (minimum 8 characters)
        #[arg(long, env = "ADMIN_PASSWORD")]
        password: String,
        /// Optional phone number
        #[arg(long)]
        phone: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_admin_create() {
        let cli = Cli::parse_from([
            "expense-tracker",
            "admin",
            "create",
            "root@x.com",
            "--password",
            "password123",
        ]);

        match cli.command {
            Commands::Admin(AdminArgs {
                action: AdminAction::Create { username, phone, .. },
            }) => {
                assert_eq!(username, "root@x.com");
                assert!(phone.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_fresh_defaults_to_unconfirmed() {
        let cli = Cli::parse_from(["expense-tracker", "migrate", "fresh"]);
        assert!(matches!(
            cli.command,
            Commands::Migrate(MigrateArgs {
                action: MigrateAction::Fresh { yes: false }
            })
        ));

        let cli = Cli::parse_from(["expense-tracker", "migrate", "fresh", "--yes"]);
        assert!(matches!(
            cli.command,
            Commands::Migrate(MigrateArgs {
                action: MigrateAction::Fresh { yes: true }
            })
        ));
    }

    #[test]
    fn test_serve_overrides_are_optional() {
        let cli = Cli::parse_from(["expense-tracker", "serve", "--port", "8080"]);
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.port, Some(8080));
                assert!(args.host.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
