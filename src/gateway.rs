//! Translation of client transport events onto the core. The socket layer
//! itself lives outside the crate; it hands each decoded event here together
//! with the sender's session tag.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{MatchpointError, Result};
use crate::events::EventFanout;
use crate::modes::GameMode;
use crate::player::PlayerStore;
use crate::queue::{Preferences, QueueEntry, QueueStore};
use crate::session::SessionManager;

/// Events a client may send over the transport.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    JoinQueue {
        player_id: Uuid,
        game_mode: String,
        #[serde(default)]
        preferences: Preferences,
    },
    LeaveQueue {
        player_id: Uuid,
        game_mode: String,
    },
    GameAction {
        game_id: Uuid,
        action: String,
        #[serde(default)]
        payload: Value,
    },
}

pub struct ClientGateway {
    players: Arc<PlayerStore>,
    queues: Arc<QueueStore>,
    sessions: Arc<SessionManager>,
    fanout: Arc<EventFanout>,
}

impl ClientGateway {
    pub fn new(
        players: Arc<PlayerStore>,
        queues: Arc<QueueStore>,
        sessions: Arc<SessionManager>,
        fanout: Arc<EventFanout>,
    ) -> Self {
        Self {
            players,
            queues,
            sessions,
            fanout,
        }
    }

    /// Handle one decoded client event. Queue operations answer with an ack
    /// or an error event; game actions have no direct reply.
    pub async fn handle(&self, session_tag: &str, event: ClientEvent) {
        let outcome = match event {
            ClientEvent::JoinQueue {
                player_id,
                game_mode,
                preferences,
            } => self.join_queue(session_tag, player_id, &game_mode, preferences).await,
            ClientEvent::LeaveQueue {
                player_id,
                game_mode,
            } => self.leave_queue(session_tag, player_id, &game_mode).await,
            ClientEvent::GameAction {
                game_id,
                action,
                payload,
            } => {
                self.sessions
                    .handle_action(game_id, session_tag, &action, payload)
                    .await;
                Ok(())
            }
        };

        if let Err(err) = outcome {
            self.fanout.error_reply(session_tag, &err.to_string()).await;
        }
    }

    /// Cancel any queue entries belonging to this transport session. Active
    /// matches the player participates in are deliberately left running.
    pub async fn disconnect(&self, session_tag: &str) {
        match self.queues.dequeue_by_session_tag(session_tag).await {
            Ok(removed) => {
                for (mode, player_id) in removed {
                    debug!(session_tag, %mode, %player_id, "queue entry cancelled on disconnect");
                    self.fanout.queue_cancelled(mode, player_id).await;
                }
            }
            Err(err) => warn!(session_tag, %err, "disconnect cleanup failed"),
        }
    }

    async fn join_queue(
        &self,
        session_tag: &str,
        player_id: Uuid,
        game_mode: &str,
        preferences: Preferences,
    ) -> Result<()> {
        let mode: GameMode = game_mode.parse()?;
        let player = self
            .players
            .get(player_id)
            .await?
            .ok_or(MatchpointError::PlayerNotFound(player_id))?;

        let entry = QueueEntry::new(&player, mode, preferences, session_tag);
        self.queues.enqueue(mode, entry.clone()).await?;

        // Joining a queue counts as presence.
        if let Err(err) = self.players.touch(player_id).await {
            debug!(%player_id, %err, "presence refresh failed");
        }

        // The ack is only sent once the entry is persisted, so no client can
        // observe a match for a queue it was never acknowledged into.
        self.fanout.queue_joined(mode, &entry).await;
        Ok(())
    }

    async fn leave_queue(&self, session_tag: &str, player_id: Uuid, game_mode: &str) -> Result<()> {
        let mode: GameMode = game_mode.parse()?;
        self.queues.dequeue(mode, player_id).await?;
        self.fanout.queue_left(mode, player_id, session_tag).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ChannelTransport, MemoryBus, ServerEvent};
    use crate::persistence::MemoryStorage;
    use crate::session::SessionConfig;
    use serde_json::json;

    struct Rig {
        gateway: ClientGateway,
        queues: Arc<QueueStore>,
        players: Arc<PlayerStore>,
        transport: Arc<ChannelTransport>,
        bus: Arc<MemoryBus>,
    }

    fn rig() -> Rig {
        let storage = Arc::new(MemoryStorage::new());
        let players = Arc::new(PlayerStore::new(storage.clone()));
        let queues = Arc::new(QueueStore::new(storage.clone()));
        let transport = Arc::new(ChannelTransport::new());
        let bus = Arc::new(MemoryBus::new());
        let fanout = Arc::new(EventFanout::new(transport.clone(), bus.clone()));
        let sessions = SessionManager::new(storage, players.clone(), fanout.clone(), SessionConfig::default());
        let gateway = ClientGateway::new(players.clone(), queues.clone(), sessions, fanout);
        Rig {
            gateway,
            queues,
            players,
            transport,
            bus,
        }
    }

    #[tokio::test]
    async fn join_queue_acks_and_publishes() {
        let rig = rig();
        let mut rx = rig.transport.register("sess-1").await;
        let alice = rig.players.create("alice", GameMode::Chess).await.unwrap();

        rig.gateway
            .handle(
                "sess-1",
                ClientEvent::JoinQueue {
                    player_id: alice.id,
                    game_mode: "chess".to_string(),
                    preferences: Preferences::default(),
                },
            )
            .await;

        assert!(matches!(
            rx.recv().await.unwrap(),
            ServerEvent::QueueJoined { game_mode } if game_mode == GameMode::Chess
        ));
        assert_eq!(rig.queues.snapshot(GameMode::Chess).await.unwrap().len(), 1);
        assert_eq!(
            rig.bus
                .with_routing_key(crate::events::routing::QUEUE_JOIN)
                .await
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn unknown_player_gets_error_reply() {
        let rig = rig();
        let mut rx = rig.transport.register("sess-1").await;

        rig.gateway
            .handle(
                "sess-1",
                ClientEvent::JoinQueue {
                    player_id: Uuid::new_v4(),
                    game_mode: "chess".to_string(),
                    preferences: Preferences::default(),
                },
            )
            .await;

        assert!(matches!(rx.recv().await.unwrap(), ServerEvent::Error { .. }));
        assert!(rig.queues.snapshot(GameMode::Chess).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_mode_gets_error_reply() {
        let rig = rig();
        let mut rx = rig.transport.register("sess-1").await;
        let alice = rig.players.create("alice", GameMode::Chess).await.unwrap();

        rig.gateway
            .handle(
                "sess-1",
                ClientEvent::JoinQueue {
                    player_id: alice.id,
                    game_mode: "checkers".to_string(),
                    preferences: Preferences::default(),
                },
            )
            .await;

        let event = rx.recv().await.unwrap();
        match event {
            ServerEvent::Error { message } => assert!(message.contains("checkers")),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn leave_queue_removes_entry() {
        let rig = rig();
        let mut rx = rig.transport.register("sess-1").await;
        let alice = rig.players.create("alice", GameMode::Fps).await.unwrap();

        rig.gateway
            .handle(
                "sess-1",
                ClientEvent::JoinQueue {
                    player_id: alice.id,
                    game_mode: "fps".to_string(),
                    preferences: Preferences::default(),
                },
            )
            .await;
        rig.gateway
            .handle(
                "sess-1",
                ClientEvent::LeaveQueue {
                    player_id: alice.id,
                    game_mode: "fps".to_string(),
                },
            )
            .await;

        assert!(matches!(rx.recv().await.unwrap(), ServerEvent::QueueJoined { .. }));
        assert!(matches!(rx.recv().await.unwrap(), ServerEvent::QueueLeft { .. }));
        assert!(rig.queues.snapshot(GameMode::Fps).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn disconnect_cancels_only_that_session() {
        let rig = rig();
        let alice = rig.players.create("alice", GameMode::Fps).await.unwrap();
        let bobby = rig.players.create("bobby", GameMode::Fps).await.unwrap();

        for (tag, player) in [("sess-a", &alice), ("sess-b", &bobby)] {
            rig.gateway
                .handle(
                    tag,
                    ClientEvent::JoinQueue {
                        player_id: player.id,
                        game_mode: "fps".to_string(),
                        preferences: Preferences::default(),
                    },
                )
                .await;
        }

        rig.gateway.disconnect("sess-a").await;

        let remaining = rig.queues.snapshot(GameMode::Fps).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].player_id, bobby.id);
        // Join, join, leave-on-disconnect.
        assert_eq!(
            rig.bus
                .with_routing_key(crate::events::routing::QUEUE_LEAVE)
                .await
                .len(),
            1
        );
    }

    #[test]
    fn client_events_decode_from_wire_json() {
        let event: ClientEvent = serde_json::from_value(json!({
            "type": "join_queue",
            "playerId": Uuid::nil(),
            "gameMode": "fps",
            "preferences": {"region": "eu", "ranked": true}
        }))
        .unwrap();
        match event {
            ClientEvent::JoinQueue { preferences, game_mode, .. } => {
                assert_eq!(game_mode, "fps");
                assert_eq!(preferences.region.as_deref(), Some("eu"));
            }
            other => panic!("unexpected event: {other:?}"),
        }

        let action: ClientEvent = serde_json::from_value(json!({
            "type": "game_action",
            "gameId": Uuid::nil(),
            "action": "move",
            "payload": {"from": "e2", "to": "e4"}
        }))
        .unwrap();
        assert!(matches!(action, ClientEvent::GameAction { .. }));
    }
}
