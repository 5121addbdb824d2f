use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::modes::GameMode;
use crate::queue::QueueEntry;

/// Session lifecycle. The only transitions are
/// starting -> active -> finished; a finished record is evicted from the hot
/// map after a cool-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Starting,
    Active,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndReason {
    Completed,
    Resignation,
    Timeout,
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResult {
    pub winner_id: Option<Uuid>,
    pub reason: EndReason,
}

/// One seat in a match, frozen at creation time. The rating is the value the
/// player carried when the match was made, not their live rating.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: Uuid,
    pub username: String,
    pub rating: i32,
    pub session_tag: String,
}

impl From<&QueueEntry> for Participant {
    fn from(entry: &QueueEntry) -> Self {
        Self {
            id: entry.player_id,
            username: entry.username.clone(),
            rating: entry.rating,
            session_tag: entry.session_tag.clone(),
        }
    }
}

/// A match record. Owned exclusively by the session manager until finished.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: Uuid,
    pub mode: GameMode,
    /// Participants in the order the matchmaker committed them.
    pub players: Vec<Participant>,
    pub status: GameStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub result: Option<GameResult>,
}

impl Game {
    pub fn new(id: Uuid, players: Vec<Participant>, mode: GameMode) -> Self {
        Self {
            id,
            mode,
            players,
            status: GameStatus::Starting,
            created_at: Utc::now(),
            started_at: None,
            ended_at: None,
            result: None,
        }
    }

    pub fn participant_by_tag(&self, session_tag: &str) -> Option<&Participant> {
        self.players.iter().find(|p| p.session_tag == session_tag)
    }

    /// The other seat in a two-player match.
    pub fn opponent_of(&self, player_id: Uuid) -> Option<&Participant> {
        if self.players.len() != 2 {
            return None;
        }
        self.players.iter().find(|p| p.id != player_id)
    }
}
