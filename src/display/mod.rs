//! Display formatting for terminal output
//!
//! Plain-text tables and detail views for domain entities and audit records.

pub mod audit;
pub mod entity;

pub use audit::{format_integrity_report, format_record_details, format_record_list};
pub use entity::{format_bet_list, format_draw_list, format_game_list, format_user_list};
