use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, Mutex};
use tracing::trace;
use uuid::Uuid;

use crate::error::Result;
use crate::modes::GameMode;
use crate::session::EndReason;

/// Delivery seam to connected clients, addressed by session tag. The real
/// transport (a socket layer) lives outside the core; [`ChannelTransport`]
/// backs development and tests.
#[async_trait]
pub trait ClientTransport: Send + Sync {
    async fn send(&self, session_tag: &str, event: ServerEvent) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub id: Uuid,
    pub username: String,
    pub rating: i32,
}

/// Events the core pushes to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    QueueJoined {
        game_mode: GameMode,
    },
    QueueLeft {
        game_mode: GameMode,
    },
    MatchFound {
        game_id: Uuid,
        game_mode: GameMode,
        players: Vec<PlayerSummary>,
    },
    GameStarted {
        game_id: Uuid,
        game_mode: GameMode,
    },
    GameUpdate {
        game_id: Uuid,
        payload: GameUpdatePayload,
    },
    GameEnded {
        game_id: Uuid,
        winner_id: Option<Uuid>,
        reason: EndReason,
    },
    Error {
        message: String,
    },
}

/// In-game broadcasts relayed to every participant of a match. Position,
/// rotation and target bodies are opaque to the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum GameUpdatePayload {
    Move {
        player_id: Uuid,
        #[serde(rename = "move")]
        mv: ChessMove,
        timestamp: DateTime<Utc>,
    },
    PlayerPosition {
        player_id: Uuid,
        position: Value,
        rotation: Value,
        timestamp: DateTime<Utc>,
    },
    PlayerShoot {
        player_id: Uuid,
        target: Value,
        timestamp: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChessMove {
    pub from: Value,
    pub to: Value,
}

/// Channel-backed transport: each registered session tag gets an unbounded
/// receiver. Sends to unknown tags are dropped; a missing client is a
/// disconnect, not an error.
#[derive(Default)]
pub struct ChannelTransport {
    clients: Mutex<HashMap<String, mpsc::UnboundedSender<ServerEvent>>>,
}

impl ChannelTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, session_tag: &str) -> mpsc::UnboundedReceiver<ServerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.clients.lock().await.insert(session_tag.to_string(), tx);
        rx
    }

    pub async fn unregister(&self, session_tag: &str) {
        self.clients.lock().await.remove(session_tag);
    }
}

#[async_trait]
impl ClientTransport for ChannelTransport {
    async fn send(&self, session_tag: &str, event: ServerEvent) -> Result<()> {
        let clients = self.clients.lock().await;
        match clients.get(session_tag) {
            Some(tx) => {
                if tx.send(event).is_err() {
                    trace!(session_tag, "client receiver dropped");
                }
            }
            None => trace!(session_tag, "no client registered for send"),
        }
        Ok(())
    }
}
