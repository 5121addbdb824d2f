use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::player::Player;
use crate::modes::GameMode;

/// Matchmaking preferences a client may attach when joining a queue. A fixed
/// record: unrecognized keys in the incoming payload are dropped by serde.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub region: Option<String>,
    pub time_control: Option<String>,
    pub max_latency: Option<u32>,
    pub skill_level: Option<String>,
}

/// A player's waiting record inside one mode queue. The rating and username
/// are cached at enqueue time so match emission needs no further lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub player_id: Uuid,
    pub username: String,
    pub rating: i32,
    /// Transport identity of the waiting client; used to address replies and
    /// to cancel the entry on disconnect.
    pub session_tag: String,
    pub preferences: Preferences,
    pub joined_at: DateTime<Utc>,
    #[serde(default)]
    pub search_expansion: u32,
}

impl QueueEntry {
    pub fn new(player: &Player, mode: GameMode, preferences: Preferences, session_tag: &str) -> Self {
        Self {
            player_id: player.id,
            username: player.username.clone(),
            rating: player.rating(mode),
            session_tag: session_tag.to_string(),
            preferences,
            joined_at: Utc::now(),
            search_expansion: 0,
        }
    }

    /// Time this entry has been waiting.
    pub fn wait(&self, now: DateTime<Utc>) -> chrono::Duration {
        (now - self.joined_at).max(chrono::Duration::zero())
    }
}
