//! Game type CLI commands

use clap::Subcommand;

use crate::display::format_game_list;
use crate::error::{SimulottoError, SimulottoResult};
use crate::services::GameTypeService;
use crate::storage::Storage;

/// Game type subcommands
#[derive(Subcommand)]
pub enum GameCommands {
    /// Define a new game
    Create {
        /// Game name
        name: String,
        /// How many numbers a bet picks
        #[arg(short, long)]
        picks: u8,
        /// Highest number that can be picked
        #[arg(short, long)]
        max: u8,
    },
    /// List all games
    List,
    /// Rename a game
    Rename {
        /// Game name or ID
        game: String,
        /// New name
        name: String,
    },
    /// Delete a game nothing refers to
    Delete {
        /// Game name or ID
        game: String,
    },
}

/// Handle a game command
pub fn handle_game_command(storage: &Storage, cmd: GameCommands) -> SimulottoResult<()> {
    let service = GameTypeService::new(storage);

    match cmd {
        GameCommands::Create { name, picks, max } => {
            let game = service.create(&name, picks, max)?;
            println!(
                "Created game: {} ({} of 1-{}) {}",
                game.name, game.picks, game.max_number, game.id
            );
        }

        GameCommands::List => {
            print!("{}", format_game_list(&service.list()?));
        }

        GameCommands::Rename { game, name } => {
            let g = service
                .find(&game)?
                .ok_or_else(|| SimulottoError::game_type_not_found(&game))?;
            let renamed = service.rename(g.id, &name)?;
            println!("Renamed game: '{}' -> '{}'", g.name, renamed.name);
        }

        GameCommands::Delete { game } => {
            let g = service
                .find(&game)?
                .ok_or_else(|| SimulottoError::game_type_not_found(&game))?;
            let deleted = service.delete(g.id)?;
            println!("Deleted game: {}", deleted.name);
        }
    }

    Ok(())
}
