//! Bet model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::draw::Draw;
use super::ids::{BetId, GameTypeId, UserId};

/// A user's pick of numbers for a game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bet {
    pub id: BetId,
    pub user_id: UserId,
    pub game_type_id: GameTypeId,
    pub numbers: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bet {
    /// Create a new bet
    pub fn new(user_id: UserId, game_type_id: GameTypeId, numbers: Vec<u8>) -> Self {
        let now = Utc::now();
        Self {
            id: BetId::new(),
            user_id,
            game_type_id,
            numbers,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the picked numbers
    pub fn set_numbers(&mut self, numbers: Vec<u8>) {
        self.numbers = numbers;
        self.updated_at = Utc::now();
    }

    /// How many of this bet's numbers appear in the draw
    pub fn hits(&self, draw: &Draw) -> usize {
        if draw.game_type_id != self.game_type_id {
            return 0;
        }
        self.numbers
            .iter()
            .filter(|n| draw.numbers.contains(n))
            .count()
    }

    /// Whether every picked number was drawn
    pub fn is_winner(&self, draw: &Draw) -> bool {
        !self.numbers.is_empty() && self.hits(draw) == self.numbers.len()
    }
}
