use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::interval;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::compat::compatible;
use crate::error::Result;
use crate::events::EventFanout;
use crate::modes::GameMode;
use crate::queue::{QueueEntry, QueueStore};
use crate::session::{Participant, SessionManager};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Spacing between ticks of one mode. Modes tick independently.
    pub tick_interval: Duration,
    pub modes: Vec<GameMode>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(2000),
            modes: GameMode::ALL.to_vec(),
        }
    }
}

/// Periodically partitions each mode's queue into compatible groups and
/// turns every full group into a game session.
pub struct MatchmakingEngine {
    queues: Arc<QueueStore>,
    sessions: Arc<SessionManager>,
    fanout: Arc<EventFanout>,
    config: EngineConfig,
    running: AtomicBool,
}

impl MatchmakingEngine {
    pub fn new(
        queues: Arc<QueueStore>,
        sessions: Arc<SessionManager>,
        fanout: Arc<EventFanout>,
        config: EngineConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            queues,
            sessions,
            fanout,
            config,
            running: AtomicBool::new(false),
        })
    }

    /// Spawn one tick loop per configured mode. A tick that fails is logged
    /// and skipped; the unchanged queue is retried on the next tick.
    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        info!(interval_ms = self.config.tick_interval.as_millis() as u64, "matchmaking engine started");

        for mode in self.config.modes.clone() {
            let engine = Arc::clone(self);
            tokio::spawn(async move {
                let mut ticker = interval(engine.config.tick_interval);
                loop {
                    ticker.tick().await;
                    if !engine.running.load(Ordering::SeqCst) {
                        break;
                    }
                    match engine.tick(mode).await {
                        Ok(0) => {}
                        Ok(found) => debug!(%mode, found, "tick emitted matches"),
                        Err(err) => warn!(%mode, %err, "tick failed, skipping"),
                    }
                }
            });
        }
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// One matchmaking pass over a mode. Returns the number of matches
    /// emitted. Participants are only dequeued after their session exists;
    /// `match_found` is only emitted after the dequeue commits.
    pub async fn tick(&self, mode: GameMode) -> Result<usize> {
        let needed = mode.players_per_match();
        let mut entries = self.queues.snapshot(mode).await?;
        if entries.len() < needed {
            return Ok(0);
        }

        // FIFO fairness: candidates are considered in join order, not rating
        // order.
        entries.sort_by_key(|e| e.joined_at);
        let now = Utc::now();

        let mut used = vec![false; entries.len()];
        let mut emitted = 0;

        for seed in 0..entries.len() {
            if used[seed] {
                continue;
            }

            // Tentative group: the seed plus followers compatible with it.
            let mut group = vec![seed];
            for follower in seed + 1..entries.len() {
                if group.len() == needed {
                    break;
                }
                if used[follower] {
                    continue;
                }
                if compatible(&entries[seed], &entries[follower], mode, now) {
                    group.push(follower);
                }
            }
            if group.len() < needed {
                // Abandoned; members stay available as later seeds.
                continue;
            }

            let members: Vec<&QueueEntry> = group.iter().map(|&i| &entries[i]).collect();
            if let Some(_game_id) = self.commit_group(mode, &members).await {
                for index in group {
                    used[index] = true;
                }
                emitted += 1;
            }
        }

        Ok(emitted)
    }

    /// Create the session, dequeue the group, then announce the match. On
    /// any failure the members stay enqueued for the next tick.
    async fn commit_group(&self, mode: GameMode, members: &[&QueueEntry]) -> Option<Uuid> {
        let participants: Vec<Participant> =
            members.iter().map(|entry| Participant::from(*entry)).collect();
        let game_id = Uuid::new_v4();

        let game = match self.sessions.create(game_id, participants, mode).await {
            Ok(game) => game,
            Err(err) => {
                warn!(%mode, %err, "session create failed, group stays enqueued");
                return None;
            }
        };

        let player_ids: Vec<Uuid> = members.iter().map(|entry| entry.player_id).collect();
        if let Err(err) = self.queues.remove(mode, &player_ids).await {
            warn!(%mode, %err, "dequeue of matched group failed, discarding session");
            self.sessions.discard(game_id).await;
            return None;
        }

        self.fanout.match_found(&game).await;
        Some(game_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ChannelTransport, MemoryBus, ServerEvent};
    use crate::persistence::MemoryStorage;
    use crate::player::{Player, PlayerStore};
    use crate::queue::Preferences;
    use crate::session::SessionConfig;

    struct Rig {
        engine: Arc<MatchmakingEngine>,
        queues: Arc<QueueStore>,
        transport: Arc<ChannelTransport>,
    }

    fn rig() -> Rig {
        let storage = Arc::new(MemoryStorage::new());
        let players = Arc::new(PlayerStore::new(storage.clone()));
        let queues = Arc::new(QueueStore::new(storage.clone()));
        let transport = Arc::new(ChannelTransport::new());
        let fanout = Arc::new(EventFanout::new(transport.clone(), Arc::new(MemoryBus::new())));
        let sessions = SessionManager::new(storage, players, fanout.clone(), SessionConfig::default());
        let engine = MatchmakingEngine::new(queues.clone(), sessions, fanout, EngineConfig::default());
        Rig {
            engine,
            queues,
            transport,
        }
    }

    async fn enqueue(rig: &Rig, name: &str, rating: i32, mode: GameMode) -> QueueEntry {
        let mut player = Player::new(name);
        player.ratings.insert(mode, rating);
        let entry = QueueEntry::new(&player, mode, Preferences::default(), name);
        rig.queues.enqueue(mode, entry.clone()).await.unwrap();
        entry
    }

    #[tokio::test]
    async fn close_ratings_match_on_one_tick() {
        let rig = rig();
        let mut alice_rx = rig.transport.register("alice").await;
        let mut bobby_rx = rig.transport.register("bobby").await;

        enqueue(&rig, "alice", 1000, GameMode::Chess).await;
        enqueue(&rig, "bobby", 1050, GameMode::Chess).await;

        let emitted = rig.engine.tick(GameMode::Chess).await.unwrap();
        assert_eq!(emitted, 1);
        assert!(rig.queues.snapshot(GameMode::Chess).await.unwrap().is_empty());

        for rx in [&mut alice_rx, &mut bobby_rx] {
            let event = rx.recv().await.unwrap();
            match event {
                ServerEvent::MatchFound { game_mode, players, .. } => {
                    assert_eq!(game_mode, GameMode::Chess);
                    assert_eq!(players.len(), 2);
                }
                other => panic!("unexpected event: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn distant_ratings_wait_for_relaxation() {
        let rig = rig();
        enqueue(&rig, "alice", 1000, GameMode::Chess).await;
        enqueue(&rig, "carol", 1500, GameMode::Chess).await;

        assert_eq!(rig.engine.tick(GameMode::Chess).await.unwrap(), 0);
        assert_eq!(rig.queues.snapshot(GameMode::Chess).await.unwrap().len(), 2);

        // Re-enqueue both as if they had been waiting three minutes.
        for entry in rig.queues.snapshot(GameMode::Chess).await.unwrap() {
            let mut aged = entry.clone();
            aged.joined_at = aged.joined_at - chrono::Duration::seconds(170);
            rig.queues.enqueue(GameMode::Chess, aged).await.unwrap();
        }

        assert_eq!(rig.engine.tick(GameMode::Chess).await.unwrap(), 1);
        assert!(rig.queues.snapshot(GameMode::Chess).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn four_players_become_two_matches() {
        let rig = rig();
        enqueue(&rig, "p1", 1000, GameMode::Chess).await;
        enqueue(&rig, "p2", 1010, GameMode::Chess).await;
        enqueue(&rig, "p3", 1020, GameMode::Chess).await;
        enqueue(&rig, "p4", 1030, GameMode::Chess).await;

        let emitted = rig.engine.tick(GameMode::Chess).await.unwrap();
        assert_eq!(emitted, 2);
        assert!(rig.queues.snapshot(GameMode::Chess).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn undersized_queue_emits_nothing() {
        let rig = rig();
        enqueue(&rig, "lonely", 1000, GameMode::Chess).await;
        assert_eq!(rig.engine.tick(GameMode::Chess).await.unwrap(), 0);
        assert_eq!(rig.queues.snapshot(GameMode::Chess).await.unwrap().len(), 1);

        // Nine of ten for fps is still short.
        for i in 0..9 {
            enqueue(&rig, &format!("fps{i}"), 1000, GameMode::Fps).await;
        }
        assert_eq!(rig.engine.tick(GameMode::Fps).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn full_fps_lobby_matches_ten() {
        let rig = rig();
        for i in 0..10 {
            enqueue(&rig, &format!("fps{i}"), 1000 + i, GameMode::Fps).await;
        }
        assert_eq!(rig.engine.tick(GameMode::Fps).await.unwrap(), 1);
        assert!(rig.queues.snapshot(GameMode::Fps).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn disconnected_player_never_matches() {
        let rig = rig();
        enqueue(&rig, "stayer", 1000, GameMode::Chess).await;
        let goner = enqueue(&rig, "goner", 1000, GameMode::Chess).await;

        // Disconnect cancels the entry before the tick fires.
        let removed = rig.queues.dequeue_by_session_tag("goner").await.unwrap();
        assert_eq!(removed, vec![(GameMode::Chess, goner.player_id)]);

        assert_eq!(rig.engine.tick(GameMode::Chess).await.unwrap(), 0);
        let remaining = rig.queues.snapshot(GameMode::Chess).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].username, "stayer");
    }

    #[tokio::test]
    async fn incompatible_preferences_split_the_pool() {
        let rig = rig();
        let eu = Preferences {
            region: Some("eu".to_string()),
            ..Default::default()
        };
        let na = Preferences {
            region: Some("na".to_string()),
            ..Default::default()
        };
        for i in 0..5 {
            let mut player = Player::new(&format!("eu{i}"));
            player.ratings.insert(GameMode::Fps, 1000);
            let entry = QueueEntry::new(&player, GameMode::Fps, eu.clone(), &format!("eu{i}"));
            rig.queues.enqueue(GameMode::Fps, entry).await.unwrap();
        }
        for i in 0..5 {
            let mut player = Player::new(&format!("na{i}"));
            player.ratings.insert(GameMode::Fps, 1000);
            let entry = QueueEntry::new(&player, GameMode::Fps, na.clone(), &format!("na{i}"));
            rig.queues.enqueue(GameMode::Fps, entry).await.unwrap();
        }

        // Ten players, but five per region: no full lobby on either side.
        assert_eq!(rig.engine.tick(GameMode::Fps).await.unwrap(), 0);
        assert_eq!(rig.queues.snapshot(GameMode::Fps).await.unwrap().len(), 10);
    }
}
