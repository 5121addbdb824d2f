use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::modes::GameMode;
use crate::player::Player;
use crate::queue::QueueEntry;
use crate::session::Game;

/// Sliding TTLs; every write through the adapter refreshes the record's TTL.
pub const PLAYER_TTL_SECS: usize = 86_400;
pub const QUEUE_TTL_SECS: usize = 3_600;
pub const GAME_TTL_SECS: usize = 7_200;

/// The full storage contract of the core. Failures map to
/// `MatchpointError::Backend` so callers can treat them as transient.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    // Players
    async fn save_player(&self, player: &Player) -> Result<()>;
    async fn load_player(&self, id: Uuid) -> Result<Option<Player>>;

    // Leaderboards, keyed by mode name or "global".
    async fn leaderboard_upsert(&self, board: &str, player_id: Uuid, rating: i32) -> Result<()>;
    /// Top entries, descending by rating.
    async fn leaderboard_range(&self, board: &str, limit: usize) -> Result<Vec<(Uuid, i32)>>;

    // Queue entries. The waiting set is ordered by rating; entry bodies are
    // stored per player so a single removal does not rewrite the set.
    async fn save_queue_entry(&self, mode: GameMode, entry: &QueueEntry) -> Result<()>;
    /// All entries of the mode, ascending by rating.
    async fn load_queue_entries(&self, mode: GameMode) -> Result<Vec<QueueEntry>>;
    /// Returns whether an entry existed.
    async fn delete_queue_entry(&self, mode: GameMode, player_id: Uuid) -> Result<bool>;
    async fn remove_queue_entries(&self, mode: GameMode, player_ids: &[Uuid]) -> Result<()>;

    // Games
    async fn save_game(&self, game: &Game) -> Result<()>;
    async fn load_game(&self, id: Uuid) -> Result<Option<Game>>;
    async fn delete_game(&self, id: Uuid) -> Result<()>;
}
