//! Game type model
//!
//! A game definition fixes how many numbers a bet picks and the range they
//! are drawn from (e.g. 6 out of 60).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::GameTypeId;
use super::ModelValidationError;

/// A lottery game definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameType {
    pub id: GameTypeId,
    pub name: String,

    /// How many numbers a bet or draw contains
    pub picks: u8,

    /// Highest number that can be picked (lowest is always 1)
    pub max_number: u8,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GameType {
    /// Create a new game type
    pub fn new(name: impl Into<String>, picks: u8, max_number: u8) -> Self {
        let now = Utc::now();
        Self {
            id: GameTypeId::new(),
            name: name.into(),
            picks,
            max_number,
            created_at: now,
            updated_at: now,
        }
    }

    /// Validate the game definition
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.name.trim().is_empty() {
            return Err(ModelValidationError::EmptyName);
        }

        if self.picks == 0 || self.max_number < self.picks {
            return Err(ModelValidationError::InvalidGameShape {
                picks: self.picks,
                max_number: self.max_number,
            });
        }

        Ok(())
    }

    /// Check a set of numbers against this game's shape
    pub fn check_numbers(&self, numbers: &[u8]) -> Result<(), ModelValidationError> {
        if numbers.len() != usize::from(self.picks) {
            return Err(ModelValidationError::WrongPickCount {
                expected: self.picks,
                actual: numbers.len(),
            });
        }

        if let Some(&n) = numbers.iter().find(|&&n| n == 0 || n > self.max_number) {
            return Err(ModelValidationError::NumberOutOfRange {
                number: n,
                max_number: self.max_number,
            });
        }

        let mut sorted = numbers.to_vec();
        sorted.sort_unstable();
        if sorted.windows(2).any(|w| w[0] == w[1]) {
            return Err(ModelValidationError::RepeatedNumber);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_numbers() {
        let game = GameType::new("Mega", 6, 60);
        assert!(game.check_numbers(&[1, 2, 3, 4, 5, 6]).is_ok());
        assert!(game.check_numbers(&[1, 2, 3]).is_err());
        assert!(game.check_numbers(&[1, 2, 3, 4, 5, 61]).is_err());
        assert!(game.check_numbers(&[1, 1, 3, 4, 5, 6]).is_err());
    }

    #[test]
    fn test_invalid_shape() {
        let game = GameType::new("Broken", 10, 5);
        assert!(matches!(
            game.validate(),
            Err(ModelValidationError::InvalidGameShape { .. })
        ));
    }
}
