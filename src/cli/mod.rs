//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod audit;
pub mod bet;
pub mod draw;
pub mod game;
pub mod user;

pub use audit::{handle_audit_command, AuditCommands};
pub use bet::{handle_bet_command, BetCommands};
pub use draw::{handle_draw_command, DrawCommands};
pub use game::{handle_game_command, GameCommands};
pub use user::{handle_user_command, UserCommands};
