//! Bet service

use crate::error::{SimulottoError, SimulottoResult};
use crate::models::{Bet, BetId, GameTypeId, UserId};
use crate::storage::Storage;

use super::game_type::GameTypeService;

/// Service for placing and managing bets
pub struct BetService<'a> {
    storage: &'a Storage,
}

impl<'a> BetService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Place a bet for a user on a game
    pub fn place(
        &self,
        user_id: UserId,
        game_type_id: GameTypeId,
        numbers: Vec<u8>,
    ) -> SimulottoResult<Bet> {
        self.storage
            .users
            .get(user_id)?
            .ok_or_else(|| SimulottoError::user_not_found(user_id.to_string()))?;

        let game = GameTypeService::new(self.storage).require(game_type_id)?;
        game.check_numbers(&numbers)
            .map_err(|e| SimulottoError::Validation(e.to_string()))?;

        self.storage
            .bets
            .insert(Bet::new(user_id, game_type_id, numbers))
    }

    pub fn get(&self, id: BetId) -> SimulottoResult<Option<Bet>> {
        self.storage.bets.get(id)
    }

    pub fn find(&self, identifier: &str) -> SimulottoResult<Option<Bet>> {
        self.storage.bets.find(identifier)
    }

    /// Bets, optionally for one user only
    pub fn list(&self, user_id: Option<UserId>) -> SimulottoResult<Vec<Bet>> {
        let bets = self.storage.bets.list()?;
        Ok(match user_id {
            Some(id) => bets.into_iter().filter(|b| b.user_id == id).collect(),
            None => bets,
        })
    }

    /// Replace the numbers of a bet
    pub fn update_numbers(&self, id: BetId, numbers: Vec<u8>) -> SimulottoResult<Bet> {
        let bet = self
            .get(id)?
            .ok_or_else(|| SimulottoError::bet_not_found(id.to_string()))?;
        let game = GameTypeService::new(self.storage).require(bet.game_type_id)?;
        game.check_numbers(&numbers)
            .map_err(|e| SimulottoError::Validation(e.to_string()))?;

        self.storage.bets.update(id, |bet| {
            bet.set_numbers(numbers);
            Ok(())
        })
    }

    pub fn delete(&self, id: BetId) -> SimulottoResult<Bet> {
        self.storage.bets.delete(id).map_err(|e| match e {
            SimulottoError::NotFound { .. } => SimulottoError::bet_not_found(id.to_string()),
            other => other,
        })
    }
}
