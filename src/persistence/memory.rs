use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::traits::StorageAdapter;
use crate::error::Result;
use crate::modes::GameMode;
use crate::player::Player;
use crate::queue::QueueEntry;
use crate::session::Game;

/// In-memory storage for development and tests. TTLs are not enforced here;
/// expiry semantics belong to the Redis adapter.
#[derive(Default)]
pub struct MemoryStorage {
    players: RwLock<HashMap<Uuid, Player>>,
    boards: RwLock<HashMap<String, HashMap<Uuid, i32>>>,
    queues: RwLock<HashMap<GameMode, HashMap<Uuid, QueueEntry>>>,
    games: RwLock<HashMap<Uuid, Game>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageAdapter for MemoryStorage {
    async fn save_player(&self, player: &Player) -> Result<()> {
        self.players.write().await.insert(player.id, player.clone());
        Ok(())
    }

    async fn load_player(&self, id: Uuid) -> Result<Option<Player>> {
        Ok(self.players.read().await.get(&id).cloned())
    }

    async fn leaderboard_upsert(&self, board: &str, player_id: Uuid, rating: i32) -> Result<()> {
        self.boards
            .write()
            .await
            .entry(board.to_string())
            .or_default()
            .insert(player_id, rating);
        Ok(())
    }

    async fn leaderboard_range(&self, board: &str, limit: usize) -> Result<Vec<(Uuid, i32)>> {
        let boards = self.boards.read().await;
        let mut rows: Vec<(Uuid, i32)> = boards
            .get(board)
            .map(|b| b.iter().map(|(id, rating)| (*id, *rating)).collect())
            .unwrap_or_default();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn save_queue_entry(&self, mode: GameMode, entry: &QueueEntry) -> Result<()> {
        self.queues
            .write()
            .await
            .entry(mode)
            .or_default()
            .insert(entry.player_id, entry.clone());
        Ok(())
    }

    async fn load_queue_entries(&self, mode: GameMode) -> Result<Vec<QueueEntry>> {
        let queues = self.queues.read().await;
        let mut entries: Vec<QueueEntry> = queues
            .get(&mode)
            .map(|q| q.values().cloned().collect())
            .unwrap_or_default();
        // Mirror a sorted-set range scan: rating order, join time as the tie
        // break.
        entries.sort_by(|a, b| a.rating.cmp(&b.rating).then(a.joined_at.cmp(&b.joined_at)));
        Ok(entries)
    }

    async fn delete_queue_entry(&self, mode: GameMode, player_id: Uuid) -> Result<bool> {
        let mut queues = self.queues.write().await;
        Ok(queues
            .get_mut(&mode)
            .and_then(|q| q.remove(&player_id))
            .is_some())
    }

    async fn remove_queue_entries(&self, mode: GameMode, player_ids: &[Uuid]) -> Result<()> {
        let mut queues = self.queues.write().await;
        if let Some(queue) = queues.get_mut(&mode) {
            for id in player_ids {
                queue.remove(id);
            }
        }
        Ok(())
    }

    async fn save_game(&self, game: &Game) -> Result<()> {
        self.games.write().await.insert(game.id, game.clone());
        Ok(())
    }

    async fn load_game(&self, id: Uuid) -> Result<Option<Game>> {
        Ok(self.games.read().await.get(&id).cloned())
    }

    async fn delete_game(&self, id: Uuid) -> Result<()> {
        self.games.write().await.remove(&id);
        Ok(())
    }
}
