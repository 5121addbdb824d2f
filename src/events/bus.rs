use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::warn;

use crate::error::{MatchpointError, Result};

/// Topic exchanges the core publishes to. Both are declared durable by the
/// concrete bus; messages are JSON with persistent delivery.
pub const MATCHMAKING_EXCHANGE: &str = "matchmaking";
pub const GAME_EVENTS_EXCHANGE: &str = "game_events";

pub mod routing {
    pub const QUEUE_JOIN: &str = "matchmaking.queue.join";
    pub const QUEUE_LEAVE: &str = "matchmaking.queue.leave";
    pub const MATCH_CREATED: &str = "matchmaking.match.created";
    pub const GAME_STARTED: &str = "game.started";
    pub const GAME_ENDED: &str = "game.ended";
    pub const RATING_UPDATED: &str = "player.rating.updated";
}

/// Out-of-process notification seam. Publishes are best-effort: the fan-out
/// logs and swallows failures so bus loss never blocks the core loop.
#[async_trait]
pub trait EventBus: Send + Sync {
    async fn publish(&self, exchange: &str, routing_key: &str, payload: &Value) -> Result<()>;
}

pub const BUS_CONNECT_ATTEMPTS: u32 = 10;
pub const BUS_CONNECT_BACKOFF: Duration = Duration::from_secs(3);

/// Establish a bus connection, retrying on failure. Exhausting the attempts
/// is an initialization failure that aborts startup.
pub async fn connect_with_retry<B, F, Fut>(mut connect: F) -> Result<B>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<B>>,
{
    let mut last_error = String::new();
    for attempt in 1..=BUS_CONNECT_ATTEMPTS {
        match connect().await {
            Ok(bus) => return Ok(bus),
            Err(err) => {
                warn!(attempt, %err, "bus connect failed");
                last_error = err.to_string();
            }
        }
        if attempt < BUS_CONNECT_ATTEMPTS {
            tokio::time::sleep(BUS_CONNECT_BACKOFF).await;
        }
    }
    Err(MatchpointError::Init(format!(
        "bus unreachable after {BUS_CONNECT_ATTEMPTS} attempts: {last_error}"
    )))
}

#[derive(Debug, Clone, PartialEq)]
pub struct BusMessage {
    pub exchange: String,
    pub routing_key: String,
    pub payload: Value,
}

/// Recording bus for development and tests.
#[derive(Default)]
pub struct MemoryBus {
    messages: Mutex<Vec<BusMessage>>,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn published(&self) -> Vec<BusMessage> {
        self.messages.lock().await.clone()
    }

    pub async fn with_routing_key(&self, routing_key: &str) -> Vec<BusMessage> {
        self.messages
            .lock()
            .await
            .iter()
            .filter(|m| m.routing_key == routing_key)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EventBus for MemoryBus {
    async fn publish(&self, exchange: &str, routing_key: &str, payload: &Value) -> Result<()> {
        self.messages.lock().await.push(BusMessage {
            exchange: exchange.to_string(),
            routing_key: routing_key.to_string(),
            payload: payload.clone(),
        });
        Ok(())
    }
}
