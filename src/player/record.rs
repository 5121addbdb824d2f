use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::modes::GameMode;
use crate::rating::{Outcome, DEFAULT_RATING};

/// A persistent player record. Created once, mutated only by settlement and
/// presence refreshes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: Uuid,
    pub username: String,
    /// Rating per mode; every mode starts at the default.
    pub ratings: HashMap<GameMode, i32>,
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl Player {
    pub fn new(username: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username: username.to_string(),
            ratings: GameMode::ALL
                .iter()
                .map(|mode| (*mode, DEFAULT_RATING))
                .collect(),
            games_played: 0,
            wins: 0,
            losses: 0,
            draws: 0,
            created_at: now,
            last_active: now,
        }
    }

    pub fn rating(&self, mode: GameMode) -> i32 {
        self.ratings.get(&mode).copied().unwrap_or(DEFAULT_RATING)
    }

    /// Bump exactly one outcome counter along with the total.
    pub fn record_outcome(&mut self, outcome: Outcome) {
        self.games_played += 1;
        match outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
            Outcome::Draw => self.draws += 1,
        }
    }
}
