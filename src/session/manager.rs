use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

use super::game::{EndReason, Game, GameResult, GameStatus, Participant};
use crate::error::Result;
use crate::events::{ChessMove, EventFanout, GameUpdatePayload};
use crate::modes::GameMode;
use crate::persistence::StorageAdapter;
use crate::player::PlayerStore;
use crate::rating::Outcome;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Delay between match creation and automatic start.
    pub start_delay: Duration,
    /// How long a finished match stays in the hot map before eviction.
    pub finished_retention: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            start_delay: Duration::from_secs(5),
            finished_retention: Duration::from_secs(60),
        }
    }
}

struct ActionEnvelope {
    player_id: Uuid,
    action: String,
    payload: Value,
}

/// Hot entry for a live match. The snapshot is immutable and replaced
/// wholesale on every transition; the sender feeds the match's actor task,
/// which serializes action handling.
struct ActiveGame {
    snapshot: Arc<Game>,
    actions: mpsc::UnboundedSender<ActionEnvelope>,
}

/// Owns match records from creation until eviction: lifecycle transitions,
/// per-mode action dispatch, and settlement through the player store.
pub struct SessionManager {
    storage: Arc<dyn StorageAdapter>,
    players: Arc<PlayerStore>,
    fanout: Arc<EventFanout>,
    config: SessionConfig,
    games: RwLock<HashMap<Uuid, ActiveGame>>,
}

impl SessionManager {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        players: Arc<PlayerStore>,
        fanout: Arc<EventFanout>,
        config: SessionConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            storage,
            players,
            fanout,
            config,
            games: RwLock::new(HashMap::new()),
        })
    }

    /// Persist a new match, take it hot, and schedule the automatic start.
    /// The participant order is frozen as given.
    pub async fn create(
        self: &Arc<Self>,
        id: Uuid,
        players: Vec<Participant>,
        mode: GameMode,
    ) -> Result<Game> {
        let game = Game::new(id, players, mode);
        self.storage.save_game(&game).await?;

        let snapshot = Arc::new(game.clone());
        let (tx, rx) = mpsc::unbounded_channel();
        self.games.write().await.insert(
            id,
            ActiveGame {
                snapshot: Arc::clone(&snapshot),
                actions: tx,
            },
        );
        self.spawn_actor(snapshot, rx);

        let manager = Arc::clone(self);
        let delay = self.config.start_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(err) = manager.start(id).await {
                warn!(game_id = %id, %err, "scheduled start failed");
            }
        });

        Ok(game)
    }

    /// Transition starting -> active. Any other current status makes this a
    /// no-op.
    pub async fn start(&self, id: Uuid) -> Result<()> {
        let started = {
            let mut games = self.games.write().await;
            let Some(active) = games.get_mut(&id) else {
                return Ok(());
            };
            if active.snapshot.status != GameStatus::Starting {
                return Ok(());
            }
            let mut game = (*active.snapshot).clone();
            game.status = GameStatus::Active;
            game.started_at = Some(Utc::now());
            active.snapshot = Arc::new(game);
            Arc::clone(&active.snapshot)
        };

        self.storage.save_game(&started).await?;
        self.fanout.game_started(&started).await;
        Ok(())
    }

    /// Accept an in-game action. Refused silently when the match is not
    /// active or the sender is not a participant; accepted actions are
    /// queued to the match's actor so every recipient sees them in the same
    /// order.
    pub async fn handle_action(
        &self,
        game_id: Uuid,
        session_tag: &str,
        action: &str,
        payload: Value,
    ) {
        let games = self.games.read().await;
        let Some(active) = games.get(&game_id) else {
            debug!(%game_id, "action for unknown game dropped");
            return;
        };
        if active.snapshot.status != GameStatus::Active {
            debug!(%game_id, status = ?active.snapshot.status, "action before active dropped");
            return;
        }
        let Some(participant) = active.snapshot.participant_by_tag(session_tag) else {
            debug!(%game_id, session_tag, "action from non-participant dropped");
            return;
        };

        let _ = active.actions.send(ActionEnvelope {
            player_id: participant.id,
            action: action.to_string(),
            payload,
        });
    }

    /// Terminal transition. A second end on a finished match is a no-op.
    /// Chess duels settle ratings pairwise through the player store; other
    /// modes finish without rating updates.
    pub async fn end(
        self: &Arc<Self>,
        id: Uuid,
        winner_id: Option<Uuid>,
        reason: EndReason,
    ) -> Result<()> {
        let finished = {
            let mut games = self.games.write().await;
            let Some(active) = games.get_mut(&id) else {
                return Ok(());
            };
            if active.snapshot.status == GameStatus::Finished {
                return Ok(());
            }
            let mut game = (*active.snapshot).clone();
            game.status = GameStatus::Finished;
            game.ended_at = Some(Utc::now());
            game.result = Some(GameResult { winner_id, reason });
            active.snapshot = Arc::new(game);
            Arc::clone(&active.snapshot)
        };

        // Settlement and emission proceed even if the write fails; the error
        // surfaces to the caller afterwards.
        let persisted = self.storage.save_game(&finished).await;

        if finished.mode.rated() && finished.players.len() == 2 {
            self.settle(&finished).await;
        }
        self.fanout.game_ended(&finished).await;
        self.schedule_eviction(id);

        persisted
    }

    /// Read a match: the hot snapshot if live, otherwise the stored record.
    pub async fn get(&self, id: Uuid) -> Result<Option<Arc<Game>>> {
        if let Some(active) = self.games.read().await.get(&id) {
            return Ok(Some(Arc::clone(&active.snapshot)));
        }
        Ok(self.storage.load_game(id).await?.map(Arc::new))
    }

    /// Drop a match that never reached its players (its queue removal
    /// failed). Not part of the public lifecycle.
    pub(crate) async fn discard(&self, id: Uuid) {
        self.games.write().await.remove(&id);
        if let Err(err) = self.storage.delete_game(id).await {
            warn!(game_id = %id, %err, "failed to delete discarded game");
        }
    }

    fn spawn_actor(
        self: &Arc<Self>,
        game: Arc<Game>,
        mut actions: mpsc::UnboundedReceiver<ActionEnvelope>,
    ) {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(envelope) = actions.recv().await {
                manager.dispatch(&game, envelope).await;
            }
        });
    }

    async fn dispatch(self: &Arc<Self>, game: &Game, envelope: ActionEnvelope) {
        let ActionEnvelope {
            player_id,
            action,
            payload,
        } = envelope;

        match game.mode {
            GameMode::Chess => match action.as_str() {
                "move" => {
                    let update = GameUpdatePayload::Move {
                        player_id,
                        mv: ChessMove {
                            from: payload.get("from").cloned().unwrap_or(Value::Null),
                            to: payload.get("to").cloned().unwrap_or(Value::Null),
                        },
                        timestamp: Utc::now(),
                    };
                    self.fanout.game_update(game, update).await;
                }
                "resign" => {
                    let winner = game.opponent_of(player_id).map(|p| p.id);
                    if let Err(err) = self.end(game.id, winner, EndReason::Resignation).await {
                        warn!(game_id = %game.id, %err, "resignation end failed");
                    }
                }
                other => debug!(game_id = %game.id, action = other, "unknown chess action dropped"),
            },
            GameMode::Fps => match action.as_str() {
                "position_update" => {
                    let update = GameUpdatePayload::PlayerPosition {
                        player_id,
                        position: payload.get("position").cloned().unwrap_or(Value::Null),
                        rotation: payload.get("rotation").cloned().unwrap_or(Value::Null),
                        timestamp: Utc::now(),
                    };
                    self.fanout.game_update(game, update).await;
                }
                "shoot" => {
                    let update = GameUpdatePayload::PlayerShoot {
                        player_id,
                        target: payload.get("target").cloned().unwrap_or(Value::Null),
                        timestamp: Utc::now(),
                    };
                    self.fanout.game_update(game, update).await;
                }
                other => debug!(game_id = %game.id, action = other, "unknown fps action dropped"),
            },
            mode => {
                debug!(game_id = %game.id, %mode, action = %action, "no action handlers for mode");
            }
        }
    }

    async fn settle(self: &Arc<Self>, game: &Game) {
        let (a, b) = (&game.players[0], &game.players[1]);
        let winner = game.result.and_then(|r| r.winner_id);
        let (outcome_a, outcome_b) = match winner {
            None => (Outcome::Draw, Outcome::Draw),
            Some(w) if w == a.id => (Outcome::Win, Outcome::Loss),
            Some(_) => (Outcome::Loss, Outcome::Win),
        };

        for (seat, opponent, outcome) in [(a, b, outcome_a), (b, a, outcome_b)] {
            match self
                .players
                .update_rating(seat.id, game.mode, opponent.rating, outcome)
                .await
            {
                Ok(updated) => self.fanout.rating_updated(&updated, game.mode).await,
                Err(err) => {
                    warn!(game_id = %game.id, player_id = %seat.id, %err, "rating settlement failed");
                }
            }
        }
    }

    fn schedule_eviction(self: &Arc<Self>, id: Uuid) {
        let manager = Arc::clone(self);
        let delay = self.config.finished_retention;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            manager.games.write().await.remove(&id);
        });
    }
}
