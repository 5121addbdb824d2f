use std::sync::Arc;

use serde_json::{json, Value};
use tracing::warn;
use uuid::Uuid;

use super::bus::{routing, EventBus, GAME_EVENTS_EXCHANGE, MATCHMAKING_EXCHANGE};
use super::transport::{ClientTransport, GameUpdatePayload, PlayerSummary, ServerEvent};
use crate::modes::GameMode;
use crate::player::Player;
use crate::queue::QueueEntry;
use crate::session::Game;

/// Translates core events into transport sends for the participants and bus
/// publishes for everyone else. Both edges are best-effort; delivery
/// failures are logged and never propagate into the core loop.
pub struct EventFanout {
    transport: Arc<dyn ClientTransport>,
    bus: Arc<dyn EventBus>,
}

impl EventFanout {
    pub fn new(transport: Arc<dyn ClientTransport>, bus: Arc<dyn EventBus>) -> Self {
        Self { transport, bus }
    }

    async fn deliver(&self, session_tag: &str, event: ServerEvent) {
        if let Err(err) = self.transport.send(session_tag, event).await {
            warn!(session_tag, %err, "transport send failed");
        }
    }

    async fn broadcast(&self, game: &Game, event: ServerEvent) {
        for participant in &game.players {
            self.deliver(&participant.session_tag, event.clone()).await;
        }
    }

    async fn publish(&self, exchange: &str, routing_key: &str, payload: Value) {
        if let Err(err) = self.bus.publish(exchange, routing_key, &payload).await {
            warn!(routing_key, %err, "bus publish failed, dropping message");
        }
    }

    pub async fn queue_joined(&self, mode: GameMode, entry: &QueueEntry) {
        self.deliver(&entry.session_tag, ServerEvent::QueueJoined { game_mode: mode })
            .await;
        self.publish(
            MATCHMAKING_EXCHANGE,
            routing::QUEUE_JOIN,
            json!({
                "playerId": entry.player_id,
                "gameMode": mode,
                "rating": entry.rating,
            }),
        )
        .await;
    }

    pub async fn queue_left(&self, mode: GameMode, player_id: Uuid, session_tag: &str) {
        self.deliver(session_tag, ServerEvent::QueueLeft { game_mode: mode })
            .await;
        self.publish(
            MATCHMAKING_EXCHANGE,
            routing::QUEUE_LEAVE,
            json!({
                "playerId": player_id,
                "gameMode": mode,
                "reason": "leave",
            }),
        )
        .await;
    }

    /// Queue entry cancelled by disconnect; the client is gone, so this only
    /// notifies the bus.
    pub async fn queue_cancelled(&self, mode: GameMode, player_id: Uuid) {
        self.publish(
            MATCHMAKING_EXCHANGE,
            routing::QUEUE_LEAVE,
            json!({
                "playerId": player_id,
                "gameMode": mode,
                "reason": "disconnect",
            }),
        )
        .await;
    }

    pub async fn match_found(&self, game: &Game) {
        let players: Vec<PlayerSummary> = game
            .players
            .iter()
            .map(|p| PlayerSummary {
                id: p.id,
                username: p.username.clone(),
                rating: p.rating,
            })
            .collect();

        self.broadcast(
            game,
            ServerEvent::MatchFound {
                game_id: game.id,
                game_mode: game.mode,
                players: players.clone(),
            },
        )
        .await;

        self.publish(
            MATCHMAKING_EXCHANGE,
            routing::MATCH_CREATED,
            json!({
                "gameId": game.id,
                "gameMode": game.mode,
                "players": players.iter().map(|p| p.id).collect::<Vec<_>>(),
            }),
        )
        .await;
    }

    pub async fn game_started(&self, game: &Game) {
        self.broadcast(
            game,
            ServerEvent::GameStarted {
                game_id: game.id,
                game_mode: game.mode,
            },
        )
        .await;
        self.publish(
            GAME_EVENTS_EXCHANGE,
            routing::GAME_STARTED,
            json!({
                "gameId": game.id,
                "gameMode": game.mode,
                "startedAt": game.started_at,
            }),
        )
        .await;
    }

    /// Mid-flight relay to all participants of one match. Not mirrored to
    /// the bus.
    pub async fn game_update(&self, game: &Game, payload: GameUpdatePayload) {
        self.broadcast(
            game,
            ServerEvent::GameUpdate {
                game_id: game.id,
                payload,
            },
        )
        .await;
    }

    pub async fn game_ended(&self, game: &Game) {
        let result = game.result.as_ref();
        self.broadcast(
            game,
            ServerEvent::GameEnded {
                game_id: game.id,
                winner_id: result.and_then(|r| r.winner_id),
                reason: result
                    .map(|r| r.reason)
                    .unwrap_or(crate::session::EndReason::Completed),
            },
        )
        .await;
        self.publish(
            GAME_EVENTS_EXCHANGE,
            routing::GAME_ENDED,
            json!({
                "gameId": game.id,
                "gameMode": game.mode,
                "result": result,
            }),
        )
        .await;
    }

    pub async fn rating_updated(&self, player: &Player, mode: GameMode) {
        self.publish(
            GAME_EVENTS_EXCHANGE,
            routing::RATING_UPDATED,
            json!({
                "playerId": player.id,
                "gameMode": mode,
                "rating": player.rating(mode),
                "gamesPlayed": player.games_played,
            }),
        )
        .await;
    }

    pub async fn error_reply(&self, session_tag: &str, message: &str) {
        self.deliver(
            session_tag,
            ServerEvent::Error {
                message: message.to_string(),
            },
        )
        .await;
    }
}
