//! Domain data models for Simulotto
//!
//! Users, game definitions, draws and bets. These are the entities whose
//! mutations the audit trail observes; their business rules are kept to the
//! minimum needed to reject obviously broken input.

pub mod bet;
pub mod draw;
pub mod game_type;
pub mod ids;
pub mod user;

use std::fmt;

pub use bet::Bet;
pub use draw::Draw;
pub use game_type::GameType;
pub use ids::{AuditRecordId, BetId, DrawId, GameTypeId, UserId};
pub use user::User;

/// Validation errors shared by the domain models
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    EmptyName,
    InvalidEmail(String),
    InvalidGameShape { picks: u8, max_number: u8 },
    WrongPickCount { expected: u8, actual: usize },
    NumberOutOfRange { number: u8, max_number: u8 },
    RepeatedNumber,
}

impl fmt::Display for ModelValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Name cannot be empty"),
            Self::InvalidEmail(email) => write!(f, "Invalid email address: {}", email),
            Self::InvalidGameShape { picks, max_number } => write!(
                f,
                "A game cannot pick {} numbers out of {}",
                picks, max_number
            ),
            Self::WrongPickCount { expected, actual } => {
                write!(f, "Expected {} numbers, got {}", expected, actual)
            }
            Self::NumberOutOfRange { number, max_number } => {
                write!(f, "Number {} is outside 1..={}", number, max_number)
            }
            Self::RepeatedNumber => write!(f, "Numbers must not repeat"),
        }
    }
}

impl std::error::Error for ModelValidationError {}
