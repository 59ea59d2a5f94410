//! Admin command - Out-of-band administrator provisioning.

use crate::cli::args::{AdminAction, AdminArgs};
use crate::config::Config;
use crate::domain::UserRole;
use crate::errors::AppResult;
use crate::services::{ServiceContainer, Services};

/// Execute the admin command
pub async fn execute(args: AdminArgs, config: Config) -> AppResult<()> {
    let db = super::connect(&config, true).await?;
    let services = Services::from_connection(db.get_connection(), config);

    match args.action {
        AdminAction::Create {
            username,
            password,
            phone,
        } => {
            let user = services
                .auth()
                .create_user(username, password, phone, UserRole::Admin)
                .await?;
            println!("Created admin {}", user.username);
        }
    }

    Ok(())
}
