//! User CLI commands

use clap::Subcommand;

use crate::display::format_user_list;
use crate::error::{SimulottoError, SimulottoResult};
use crate::services::UserService;
use crate::storage::Storage;

/// User subcommands
#[derive(Subcommand)]
pub enum UserCommands {
    /// Register a new user
    Create {
        /// Display name
        name: String,
        /// Email address
        email: String,
    },
    /// List all users
    List,
    /// Rename a user
    Rename {
        /// User ID or email
        user: String,
        /// New name
        name: String,
    },
    /// Delete a user without bets
    Delete {
        /// User ID or email
        user: String,
    },
}

/// Handle a user command
pub fn handle_user_command(storage: &Storage, cmd: UserCommands) -> SimulottoResult<()> {
    let service = UserService::new(storage);

    match cmd {
        UserCommands::Create { name, email } => {
            let user = service.create(&name, &email)?;
            println!("Created user: {} ({})", user.name, user.id);
        }

        UserCommands::List => {
            print!("{}", format_user_list(&service.list()?));
        }

        UserCommands::Rename { user, name } => {
            let u = service
                .find(&user)?
                .ok_or_else(|| SimulottoError::user_not_found(&user))?;
            let renamed = service.rename(u.id, &name)?;
            println!("Renamed user: '{}' -> '{}'", u.name, renamed.name);
        }

        UserCommands::Delete { user } => {
            let u = service
                .find(&user)?
                .ok_or_else(|| SimulottoError::user_not_found(&user))?;
            let deleted = service.delete(u.id)?;
            println!("Deleted user: {}", deleted.name);
        }
    }

    Ok(())
}
