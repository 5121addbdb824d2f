use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use super::entry::QueueEntry;
use crate::error::Result;
use crate::modes::GameMode;
use crate::persistence::StorageAdapter;

/// Aggregate view of one mode queue, served by the status route.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    pub players_in_queue: usize,
    pub average_wait_time: u64,
    pub estimated_match_time: u64,
}

/// Owns the per-mode waiting sets. Guarantees at most one entry per
/// (player, mode); a re-enqueue supersedes the previous entry.
pub struct QueueStore {
    storage: Arc<dyn StorageAdapter>,
}

impl QueueStore {
    pub fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        Self { storage }
    }

    /// Add or replace the player's entry for the mode and refresh the queue
    /// TTL.
    pub async fn enqueue(&self, mode: GameMode, entry: QueueEntry) -> Result<()> {
        self.storage.save_queue_entry(mode, &entry).await
    }

    /// Remove the player's entry, if any. Returns whether one was removed.
    pub async fn dequeue(&self, mode: GameMode, player_id: Uuid) -> Result<bool> {
        self.storage.delete_queue_entry(mode, player_id).await
    }

    /// Cancel every queue entry carrying the session tag, across all modes.
    /// Used on client disconnect; active games are untouched.
    pub async fn dequeue_by_session_tag(&self, session_tag: &str) -> Result<Vec<(GameMode, Uuid)>> {
        let mut removed = Vec::new();
        for mode in GameMode::ALL {
            for entry in self.storage.load_queue_entries(mode).await? {
                if entry.session_tag == session_tag
                    && self.storage.delete_queue_entry(mode, entry.player_id).await?
                {
                    removed.push((mode, entry.player_id));
                }
            }
        }
        Ok(removed)
    }

    /// All current entries for a tick. Callers must tolerate entries vanishing
    /// concurrently.
    pub async fn snapshot(&self, mode: GameMode) -> Result<Vec<QueueEntry>> {
        self.storage.load_queue_entries(mode).await
    }

    /// Atomic multi-remove of a committed match group.
    pub async fn remove(&self, mode: GameMode, player_ids: &[Uuid]) -> Result<()> {
        self.storage.remove_queue_entries(mode, player_ids).await
    }

    pub async fn stats(&self, mode: GameMode) -> Result<QueueStats> {
        let entries = self.snapshot(mode).await?;
        let now = Utc::now();
        let average_wait_time = if entries.is_empty() {
            0
        } else {
            let total: i64 = entries.iter().map(|e| e.wait(now).num_seconds()).sum();
            (total / entries.len() as i64) as u64
        };

        // Rough client-facing estimate: a full queue matches on the next
        // tick, otherwise assume ~30s per missing player.
        let missing = mode.players_per_match().saturating_sub(entries.len()) as u64;
        let estimated_match_time = if missing == 0 { 2 } else { missing * 30 };

        Ok(QueueStats {
            players_in_queue: entries.len(),
            average_wait_time,
            estimated_match_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStorage;
    use crate::player::Player;
    use crate::queue::Preferences;

    fn store() -> QueueStore {
        QueueStore::new(Arc::new(MemoryStorage::new()))
    }

    fn entry(name: &str, tag: &str) -> QueueEntry {
        QueueEntry::new(&Player::new(name), GameMode::Chess, Preferences::default(), tag)
    }

    #[tokio::test]
    async fn enqueue_is_idempotent_per_player_and_mode() {
        let store = store();
        let mut first = entry("alice", "tag-a");
        store.enqueue(GameMode::Chess, first.clone()).await.unwrap();

        // Same player joins again with a new session; the entry is replaced.
        first.session_tag = "tag-b".to_string();
        store.enqueue(GameMode::Chess, first.clone()).await.unwrap();

        let snapshot = store.snapshot(GameMode::Chess).await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].session_tag, "tag-b");
    }

    #[tokio::test]
    async fn dequeue_removes_only_that_player() {
        let store = store();
        let a = entry("alice", "ta");
        let b = entry("bobby", "tb");
        store.enqueue(GameMode::Chess, a.clone()).await.unwrap();
        store.enqueue(GameMode::Chess, b.clone()).await.unwrap();

        assert!(store.dequeue(GameMode::Chess, a.player_id).await.unwrap());
        assert!(!store.dequeue(GameMode::Chess, a.player_id).await.unwrap());

        let snapshot = store.snapshot(GameMode::Chess).await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].player_id, b.player_id);
    }

    #[tokio::test]
    async fn session_tag_cancel_spans_modes() {
        let store = store();
        let player = Player::new("frank");
        let chess = QueueEntry::new(&player, GameMode::Chess, Preferences::default(), "sess-x");
        let fps = QueueEntry::new(&player, GameMode::Fps, Preferences::default(), "sess-x");
        let other = entry("gina", "sess-y");

        store.enqueue(GameMode::Chess, chess).await.unwrap();
        store.enqueue(GameMode::Fps, fps).await.unwrap();
        store.enqueue(GameMode::Chess, other.clone()).await.unwrap();

        let removed = store.dequeue_by_session_tag("sess-x").await.unwrap();
        assert_eq!(removed.len(), 2);
        assert!(removed.iter().all(|(_, id)| *id == player.id));

        let snapshot = store.snapshot(GameMode::Chess).await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].player_id, other.player_id);
        assert!(store.snapshot(GameMode::Fps).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn remove_clears_a_whole_group() {
        let store = store();
        let a = entry("alice", "ta");
        let b = entry("bobby", "tb");
        let c = entry("carol", "tc");
        for e in [&a, &b, &c] {
            store.enqueue(GameMode::Chess, e.clone()).await.unwrap();
        }

        store
            .remove(GameMode::Chess, &[a.player_id, b.player_id])
            .await
            .unwrap();
        let snapshot = store.snapshot(GameMode::Chess).await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].player_id, c.player_id);
    }

    #[tokio::test]
    async fn concurrent_enqueues_all_land() {
        let store = Arc::new(QueueStore::new(Arc::new(MemoryStorage::new())));

        let mut handles = Vec::new();
        for i in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let player = Player::new(&format!("player{i}"));
                let entry = QueueEntry::new(
                    &player,
                    GameMode::Fps,
                    Preferences::default(),
                    &format!("sess-{i}"),
                );
                store.enqueue(GameMode::Fps, entry).await
            }));
        }

        for result in futures::future::join_all(handles).await {
            assert!(result.unwrap().is_ok());
        }
        assert_eq!(store.snapshot(GameMode::Fps).await.unwrap().len(), 20);
    }

    #[tokio::test]
    async fn stats_report_queue_depth() {
        let store = store();
        assert_eq!(store.stats(GameMode::Chess).await.unwrap().players_in_queue, 0);

        store.enqueue(GameMode::Chess, entry("alice", "t")).await.unwrap();
        let stats = store.stats(GameMode::Chess).await.unwrap();
        assert_eq!(stats.players_in_queue, 1);
        assert!(stats.estimated_match_time > 0);
    }
}
