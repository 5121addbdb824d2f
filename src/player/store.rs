use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use super::record::Player;
use crate::error::{MatchpointError, Result};
use crate::modes::GameMode;
use crate::persistence::StorageAdapter;
use crate::rating::{self, Outcome, DEFAULT_K_FACTOR};

/// Which leaderboard to read: one mode's board or the global aggregate
/// seeded at player creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderboardScope {
    Global,
    Mode(GameMode),
}

impl LeaderboardScope {
    pub fn key(&self) -> &'static str {
        match self {
            LeaderboardScope::Global => "global",
            LeaderboardScope::Mode(mode) => mode.as_str(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRow {
    pub rank: u32,
    pub id: Uuid,
    pub username: String,
    pub rating: i32,
    pub games_played: u32,
}

/// Owns player records and leaderboards. All access to the backing store for
/// player data goes through here.
pub struct PlayerStore {
    storage: Arc<dyn StorageAdapter>,
}

impl PlayerStore {
    pub fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        Self { storage }
    }

    /// Create and persist a fresh player, seeding the global leaderboard at
    /// the primary mode's rating.
    pub async fn create(&self, username: &str, primary_mode: GameMode) -> Result<Player> {
        let name = username.trim();
        if name.chars().filter(|c| !c.is_control()).count() < 2 {
            return Err(MatchpointError::InvalidInput(
                "username must be at least 2 printable characters".to_string(),
            ));
        }

        let player = Player::new(name);
        self.storage.save_player(&player).await?;
        self.storage
            .leaderboard_upsert(LeaderboardScope::Global.key(), player.id, player.rating(primary_mode))
            .await?;
        Ok(player)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Player>> {
        self.storage.load_player(id).await
    }

    /// Apply one game result: Elo update, exactly one counter bump, presence
    /// refresh, persist, and leaderboard upsert for the mode.
    pub async fn update_rating(
        &self,
        id: Uuid,
        mode: GameMode,
        opponent_rating: i32,
        outcome: Outcome,
    ) -> Result<Player> {
        let mut player = self
            .storage
            .load_player(id)
            .await?
            .ok_or(MatchpointError::PlayerNotFound(id))?;

        let updated = rating::rate(player.rating(mode), opponent_rating, outcome, DEFAULT_K_FACTOR);
        player.ratings.insert(mode, updated);
        player.record_outcome(outcome);
        player.last_active = Utc::now();

        self.storage.save_player(&player).await?;
        self.storage
            .leaderboard_upsert(mode.as_str(), id, updated)
            .await?;
        Ok(player)
    }

    /// Presence refresh; also renews the record's TTL since it is a write.
    pub async fn touch(&self, id: Uuid) -> Result<()> {
        let mut player = self
            .storage
            .load_player(id)
            .await?
            .ok_or(MatchpointError::PlayerNotFound(id))?;
        player.last_active = Utc::now();
        self.storage.save_player(&player).await
    }

    /// Read a leaderboard, descending by rating, with 1-based dense ranks.
    /// Entries whose player record has expired are skipped.
    pub async fn leaderboard(
        &self,
        scope: LeaderboardScope,
        limit: usize,
    ) -> Result<Vec<LeaderboardRow>> {
        let scores = self.storage.leaderboard_range(scope.key(), limit).await?;

        let mut rows = Vec::with_capacity(scores.len());
        let mut rank = 0u32;
        let mut previous: Option<i32> = None;
        for (id, score) in scores {
            let Some(player) = self.storage.load_player(id).await? else {
                continue;
            };
            if previous != Some(score) {
                rank += 1;
                previous = Some(score);
            }
            rows.push(LeaderboardRow {
                rank,
                id,
                username: player.username,
                rating: score,
                games_played: player.games_played,
            });
        }
        Ok(rows)
    }
}
