//! Draw CLI commands

use chrono::{DateTime, NaiveDate, Utc};
use clap::Subcommand;

use crate::display::{format_bet_list, format_draw_list};
use crate::error::{SimulottoError, SimulottoResult};
use crate::services::{DrawService, GameTypeService};
use crate::storage::Storage;

/// Draw subcommands
#[derive(Subcommand)]
pub enum DrawCommands {
    /// Record the numbers drawn for a game
    Record {
        /// Game name or ID
        game: String,
        /// Drawn numbers, comma separated
        #[arg(value_delimiter = ',', num_args = 1..)]
        numbers: Vec<u8>,
        /// Draw date (YYYY-MM-DD), defaults to now
        #[arg(short, long)]
        date: Option<String>,
    },
    /// List draws
    List {
        /// Only draws of this game
        #[arg(short, long)]
        game: Option<String>,
    },
    /// Correct the numbers of a draw
    Correct {
        /// Draw ID
        draw: String,
        #[arg(value_delimiter = ',', num_args = 1..)]
        numbers: Vec<u8>,
    },
    /// Delete a draw
    Delete {
        /// Draw ID
        draw: String,
    },
    /// Show winning bets for a draw
    Winners {
        /// Draw ID
        draw: String,
    },
}

/// Handle a draw command
pub fn handle_draw_command(storage: &Storage, cmd: DrawCommands) -> SimulottoResult<()> {
    let service = DrawService::new(storage);
    let games = GameTypeService::new(storage);

    match cmd {
        DrawCommands::Record { game, numbers, date } => {
            let g = games
                .find(&game)?
                .ok_or_else(|| SimulottoError::game_type_not_found(&game))?;
            let drawn_at = match date {
                Some(d) => parse_date(&d)?,
                None => Utc::now(),
            };
            let draw = service.record(g.id, drawn_at, numbers)?;
            println!("Recorded draw {} for {}", draw.id, g.name);
        }

        DrawCommands::List { game } => {
            let game_id = match game {
                Some(game) => Some(
                    games
                        .find(&game)?
                        .ok_or_else(|| SimulottoError::game_type_not_found(&game))?
                        .id,
                ),
                None => None,
            };
            print!("{}", format_draw_list(&service.list(game_id)?));
        }

        DrawCommands::Correct { draw, numbers } => {
            let d = service
                .find(&draw)?
                .ok_or_else(|| SimulottoError::draw_not_found(&draw))?;
            let corrected = service.correct(d.id, numbers)?;
            println!("Corrected draw {}: {:?}", corrected.id, corrected.numbers);
        }

        DrawCommands::Delete { draw } => {
            let d = service
                .find(&draw)?
                .ok_or_else(|| SimulottoError::draw_not_found(&draw))?;
            service.delete(d.id)?;
            println!("Deleted draw {}", d.id);
        }

        DrawCommands::Winners { draw } => {
            let d = service
                .find(&draw)?
                .ok_or_else(|| SimulottoError::draw_not_found(&draw))?;
            print!("{}", format_bet_list(&service.winners(d.id)?));
        }
    }

    Ok(())
}

fn parse_date(s: &str) -> SimulottoResult<DateTime<Utc>> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| SimulottoError::Validation(format!("Invalid date '{}', expected YYYY-MM-DD", s)))
}
