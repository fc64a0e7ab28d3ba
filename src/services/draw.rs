//! Draw service

use chrono::{DateTime, Utc};

use crate::error::{SimulottoError, SimulottoResult};
use crate::models::{Bet, Draw, DrawId, GameTypeId};
use crate::storage::Storage;

use super::game_type::GameTypeService;

/// Service for recording draws
pub struct DrawService<'a> {
    storage: &'a Storage,
}

impl<'a> DrawService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Record the numbers drawn for a game
    pub fn record(
        &self,
        game_type_id: GameTypeId,
        drawn_at: DateTime<Utc>,
        numbers: Vec<u8>,
    ) -> SimulottoResult<Draw> {
        let game = GameTypeService::new(self.storage).require(game_type_id)?;
        game.check_numbers(&numbers)
            .map_err(|e| SimulottoError::Validation(e.to_string()))?;

        self.storage
            .draws
            .insert(Draw::new(game_type_id, drawn_at, numbers))
    }

    pub fn get(&self, id: DrawId) -> SimulottoResult<Option<Draw>> {
        self.storage.draws.get(id)
    }

    pub fn find(&self, identifier: &str) -> SimulottoResult<Option<Draw>> {
        self.storage.draws.find(identifier)
    }

    /// Draws, optionally restricted to one game
    pub fn list(&self, game_type_id: Option<GameTypeId>) -> SimulottoResult<Vec<Draw>> {
        let draws = self.storage.draws.list()?;
        Ok(match game_type_id {
            Some(id) => draws.into_iter().filter(|d| d.game_type_id == id).collect(),
            None => draws,
        })
    }

    /// Correct the numbers of a recorded draw
    pub fn correct(&self, id: DrawId, numbers: Vec<u8>) -> SimulottoResult<Draw> {
        let draw = self
            .get(id)?
            .ok_or_else(|| SimulottoError::draw_not_found(id.to_string()))?;
        let game = GameTypeService::new(self.storage).require(draw.game_type_id)?;
        game.check_numbers(&numbers)
            .map_err(|e| SimulottoError::Validation(e.to_string()))?;

        self.storage.draws.update(id, |draw| {
            draw.numbers = numbers;
            draw.updated_at = Utc::now();
            Ok(())
        })
    }

    pub fn delete(&self, id: DrawId) -> SimulottoResult<Draw> {
        self.storage.draws.delete(id)
    }

    /// Bets on the draw's game whose numbers were all drawn
    pub fn winners(&self, id: DrawId) -> SimulottoResult<Vec<Bet>> {
        let draw = self
            .get(id)?
            .ok_or_else(|| SimulottoError::draw_not_found(id.to_string()))?;
        Ok(self
            .storage
            .bets
            .list()?
            .into_iter()
            .filter(|b| b.is_winner(&draw))
            .collect())
    }
}
