use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use uuid::Uuid;

use super::traits::{StorageAdapter, GAME_TTL_SECS, PLAYER_TTL_SECS, QUEUE_TTL_SECS};
use crate::error::{MatchpointError, Result};
use crate::modes::GameMode;
use crate::player::Player;
use crate::queue::QueueEntry;
use crate::session::Game;

fn backend<E: std::fmt::Display>(err: E) -> MatchpointError {
    MatchpointError::Backend(err.to_string())
}

fn player_key(id: Uuid) -> String {
    format!("player:{id}")
}

fn game_key(id: Uuid) -> String {
    format!("game:{id}")
}

fn queue_key(mode: GameMode) -> String {
    format!("queue:{mode}")
}

fn queue_entry_key(mode: GameMode, player_id: Uuid) -> String {
    format!("queue:{mode}:entry:{player_id}")
}

fn board_key(board: &str) -> String {
    format!("leaderboard:{board}")
}

/// Redis-backed storage. Sorted-set members are player ids scored by rating;
/// entry bodies are separate keys so one removal stays O(log n).
pub struct RedisStorage {
    conn: ConnectionManager,
}

impl RedisStorage {
    /// Connect and verify the backend is reachable. A failure here is fatal
    /// to startup.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = Client::open(url).map_err(|e| MatchpointError::Init(e.to_string()))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| MatchpointError::Init(e.to_string()))?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl StorageAdapter for RedisStorage {
    async fn save_player(&self, player: &Player) -> Result<()> {
        let json = serde_json::to_string(player).map_err(backend)?;
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(player_key(player.id), json, PLAYER_TTL_SECS)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn load_player(&self, id: Uuid) -> Result<Option<Player>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(player_key(id)).await.map_err(backend)?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json).map_err(backend)?)),
            None => Ok(None),
        }
    }

    async fn leaderboard_upsert(&self, board: &str, player_id: Uuid, rating: i32) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .zadd(board_key(board), player_id.to_string(), rating)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn leaderboard_range(&self, board: &str, limit: usize) -> Result<Vec<(Uuid, i32)>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        let rows: Vec<(String, f64)> = conn
            .zrevrange_withscores(board_key(board), 0, limit as isize - 1)
            .await
            .map_err(backend)?;
        Ok(rows
            .into_iter()
            .filter_map(|(id, score)| Uuid::parse_str(&id).ok().map(|id| (id, score as i32)))
            .collect())
    }

    async fn save_queue_entry(&self, mode: GameMode, entry: &QueueEntry) -> Result<()> {
        let json = serde_json::to_string(entry).map_err(backend)?;
        let mut conn = self.conn.clone();
        let _: () = conn
            .zadd(queue_key(mode), entry.player_id.to_string(), entry.rating)
            .await
            .map_err(backend)?;
        let _: () = conn
            .set_ex(queue_entry_key(mode, entry.player_id), json, QUEUE_TTL_SECS)
            .await
            .map_err(backend)?;
        let _: () = conn
            .expire(queue_key(mode), QUEUE_TTL_SECS)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn load_queue_entries(&self, mode: GameMode) -> Result<Vec<QueueEntry>> {
        let mut conn = self.conn.clone();
        let ids: Vec<String> = conn.zrange(queue_key(mode), 0, -1).await.map_err(backend)?;

        let mut entries = Vec::with_capacity(ids.len());
        for id in ids {
            let Ok(player_id) = Uuid::parse_str(&id) else {
                continue;
            };
            // Bodies may expire or be removed between the scan and the get.
            let raw: Option<String> = conn
                .get(queue_entry_key(mode, player_id))
                .await
                .map_err(backend)?;
            if let Some(json) = raw {
                if let Ok(entry) = serde_json::from_str::<QueueEntry>(&json) {
                    entries.push(entry);
                }
            }
        }
        Ok(entries)
    }

    async fn delete_queue_entry(&self, mode: GameMode, player_id: Uuid) -> Result<bool> {
        let mut conn = self.conn.clone();
        let removed: i32 = conn
            .zrem(queue_key(mode), player_id.to_string())
            .await
            .map_err(backend)?;
        let _: () = conn
            .del(queue_entry_key(mode, player_id))
            .await
            .map_err(backend)?;
        Ok(removed > 0)
    }

    async fn remove_queue_entries(&self, mode: GameMode, player_ids: &[Uuid]) -> Result<()> {
        if player_ids.is_empty() {
            return Ok(());
        }
        let members: Vec<String> = player_ids.iter().map(Uuid::to_string).collect();
        let entry_keys: Vec<String> = player_ids
            .iter()
            .map(|id| queue_entry_key(mode, *id))
            .collect();

        let mut conn = self.conn.clone();
        let _: () = conn
            .zrem(queue_key(mode), members)
            .await
            .map_err(backend)?;
        let _: () = conn.del(entry_keys).await.map_err(backend)?;
        Ok(())
    }

    async fn save_game(&self, game: &Game) -> Result<()> {
        let json = serde_json::to_string(game).map_err(backend)?;
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(game_key(game.id), json, GAME_TTL_SECS)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn load_game(&self, id: Uuid) -> Result<Option<Game>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(game_key(id)).await.map_err(backend)?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json).map_err(backend)?)),
            None => Ok(None),
        }
    }

    async fn delete_game(&self, id: Uuid) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(game_key(id)).await.map_err(backend)?;
        Ok(())
    }
}
