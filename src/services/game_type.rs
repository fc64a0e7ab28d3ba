//! Game type service

use chrono::Utc;

use crate::error::{SimulottoError, SimulottoResult};
use crate::models::{GameType, GameTypeId};
use crate::storage::Storage;

/// Service for game definitions
pub struct GameTypeService<'a> {
    storage: &'a Storage,
}

impl<'a> GameTypeService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Define a new game: pick `picks` numbers out of `1..=max_number`
    pub fn create(&self, name: &str, picks: u8, max_number: u8) -> SimulottoResult<GameType> {
        let name = name.trim();

        if self.find_by_name(name)?.is_some() {
            return Err(SimulottoError::Duplicate {
                entity_type: "Game type",
                identifier: name.to_string(),
            });
        }

        let game = GameType::new(name, picks, max_number);
        game.validate()
            .map_err(|e| SimulottoError::Validation(e.to_string()))?;

        self.storage.game_types.insert(game)
    }

    pub fn get(&self, id: GameTypeId) -> SimulottoResult<Option<GameType>> {
        self.storage.game_types.get(id)
    }

    /// Look up a game type, failing if it doesn't exist
    pub fn require(&self, id: GameTypeId) -> SimulottoResult<GameType> {
        self.get(id)?
            .ok_or_else(|| SimulottoError::game_type_not_found(id.to_string()))
    }

    /// Find a game type by id or name (case-insensitive)
    pub fn find(&self, identifier: &str) -> SimulottoResult<Option<GameType>> {
        if let Some(game) = self.storage.game_types.find(identifier)? {
            return Ok(Some(game));
        }
        self.find_by_name(identifier)
    }

    fn find_by_name(&self, name: &str) -> SimulottoResult<Option<GameType>> {
        let name = name.trim().to_lowercase();
        Ok(self
            .storage
            .game_types
            .list()?
            .into_iter()
            .find(|g| g.name.to_lowercase() == name))
    }

    pub fn list(&self) -> SimulottoResult<Vec<GameType>> {
        self.storage.game_types.list()
    }

    pub fn rename(&self, id: GameTypeId, name: &str) -> SimulottoResult<GameType> {
        self.storage.game_types.update(id, |game| {
            game.name = name.trim().to_string();
            game.updated_at = Utc::now();
            game.validate()
                .map_err(|e| SimulottoError::Validation(e.to_string()))
        })
    }

    /// Delete a game type nothing refers to
    pub fn delete(&self, id: GameTypeId) -> SimulottoResult<GameType> {
        let in_use = self.storage.bets.list()?.iter().any(|b| b.game_type_id == id)
            || self.storage.draws.list()?.iter().any(|d| d.game_type_id == id);
        if in_use {
            return Err(SimulottoError::Validation(format!(
                "Game type {} is still used by bets or draws",
                id
            )));
        }

        self.storage.game_types.delete(id)
    }
}
