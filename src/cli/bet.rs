//! Bet CLI commands

use clap::Subcommand;

use crate::display::format_bet_list;
use crate::error::{SimulottoError, SimulottoResult};
use crate::services::{BetService, GameTypeService, UserService};
use crate::storage::Storage;

/// Bet subcommands
#[derive(Subcommand)]
pub enum BetCommands {
    /// Place a bet
    Place {
        /// User ID or email
        user: String,
        /// Game name or ID
        game: String,
        /// Picked numbers, comma separated
        #[arg(value_delimiter = ',', num_args = 1..)]
        numbers: Vec<u8>,
    },
    /// List bets
    List {
        /// Only bets of this user
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Replace the numbers of a bet
    Update {
        /// Bet ID
        bet: String,
        #[arg(value_delimiter = ',', num_args = 1..)]
        numbers: Vec<u8>,
    },
    /// Delete a bet
    Delete {
        /// Bet ID
        bet: String,
    },
}

/// Handle a bet command
pub fn handle_bet_command(storage: &Storage, cmd: BetCommands) -> SimulottoResult<()> {
    let service = BetService::new(storage);
    let users = UserService::new(storage);

    match cmd {
        BetCommands::Place {
            user,
            game,
            numbers,
        } => {
            let u = users
                .find(&user)?
                .ok_or_else(|| SimulottoError::user_not_found(&user))?;
            let g = GameTypeService::new(storage)
                .find(&game)?
                .ok_or_else(|| SimulottoError::game_type_not_found(&game))?;
            let bet = service.place(u.id, g.id, numbers)?;
            println!("Placed bet {} ({})", bet.id, bet.id.full());
        }

        BetCommands::List { user } => {
            let user_id = match user {
                Some(user) => Some(
                    users
                        .find(&user)?
                        .ok_or_else(|| SimulottoError::user_not_found(&user))?
                        .id,
                ),
                None => None,
            };
            print!("{}", format_bet_list(&service.list(user_id)?));
        }

        BetCommands::Update { bet, numbers } => {
            let b = service
                .find(&bet)?
                .ok_or_else(|| SimulottoError::bet_not_found(&bet))?;
            let updated = service.update_numbers(b.id, numbers)?;
            println!(
                "Updated bet {}: {:?} -> {:?}",
                updated.id, b.numbers, updated.numbers
            );
        }

        BetCommands::Delete { bet } => {
            let b = service
                .find(&bet)?
                .ok_or_else(|| SimulottoError::bet_not_found(&bet))?;
            service.delete(b.id)?;
            println!("Deleted bet {}", b.id);
        }
    }

    Ok(())
}
