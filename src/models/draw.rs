//! Draw model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{DrawId, GameTypeId};

/// The numbers drawn for a game at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draw {
    pub id: DrawId,
    pub game_type_id: GameTypeId,
    pub drawn_at: DateTime<Utc>,
    pub numbers: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Draw {
    /// Create a new draw
    pub fn new(game_type_id: GameTypeId, drawn_at: DateTime<Utc>, numbers: Vec<u8>) -> Self {
        let now = Utc::now();
        Self {
            id: DrawId::new(),
            game_type_id,
            drawn_at,
            numbers,
            created_at: now,
            updated_at: now,
        }
    }
}
