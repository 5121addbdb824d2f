//! The fixed HTTP collaborator routes: player seeding, queue status, match
//! lookup and health.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::{MatchpointError, Result};
use crate::modes::{GameMode, ModeConfig};
use crate::player::{LeaderboardRow, LeaderboardScope, Player, PlayerStore};
use crate::queue::{QueueStats, QueueStore};
use crate::session::{Game, SessionManager};

#[derive(Clone)]
pub struct ApiState {
    pub players: Arc<PlayerStore>,
    pub queues: Arc<QueueStore>,
    pub sessions: Arc<SessionManager>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/players", post(create_player))
        .route("/api/players/:id", get(get_player))
        .route("/api/queue/status", get(queue_status))
        .route("/api/games/:id", get(get_game))
        .route("/api/leaderboard/:scope", get(leaderboard))
        .route("/health", get(health))
        .with_state(state)
}

impl IntoResponse for MatchpointError {
    fn into_response(self) -> Response {
        let status = match &self {
            MatchpointError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            MatchpointError::PlayerNotFound(_) | MatchpointError::GameNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            MatchpointError::Conflict(_) => StatusCode::CONFLICT,
            MatchpointError::Backend(_) => StatusCode::SERVICE_UNAVAILABLE,
            MatchpointError::Init(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePlayerRequest {
    username: String,
    game_mode: String,
}

async fn create_player(
    State(state): State<ApiState>,
    Json(request): Json<CreatePlayerRequest>,
) -> Result<(StatusCode, Json<Player>)> {
    let mode: GameMode = request.game_mode.parse()?;
    let player = state.players.create(&request.username, mode).await?;
    Ok((StatusCode::CREATED, Json(player)))
}

async fn get_player(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Player>> {
    state
        .players
        .get(id)
        .await?
        .map(Json)
        .ok_or(MatchpointError::PlayerNotFound(id))
}

async fn queue_status(
    State(state): State<ApiState>,
) -> Result<Json<BTreeMap<&'static str, QueueStats>>> {
    let mut status = BTreeMap::new();
    for mode in GameMode::ALL {
        status.insert(mode.as_str(), state.queues.stats(mode).await?);
    }
    Ok(Json(status))
}

/// The stored match plus its mode's static config.
#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct GameView<'a> {
    #[serde(flatten)]
    game: &'a Game,
    config: &'static ModeConfig,
}

async fn get_game(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    let game = state
        .sessions
        .get(id)
        .await?
        .ok_or(MatchpointError::GameNotFound(id))?;
    let view = GameView {
        game: &game,
        config: game.mode.config(),
    };
    Ok(Json(&view).into_response())
}

#[derive(Debug, Deserialize)]
struct LeaderboardQuery {
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    10
}

async fn leaderboard(
    State(state): State<ApiState>,
    Path(scope): Path<String>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<LeaderboardRow>>> {
    let scope = if scope == "global" {
        LeaderboardScope::Global
    } else {
        LeaderboardScope::Mode(scope.parse()?)
    };
    let rows = state.players.leaderboard(scope, query.limit).await?;
    Ok(Json(rows))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "timestamp": Utc::now() }))
}
