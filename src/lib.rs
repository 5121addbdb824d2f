//! Matchpoint
//!
//! A matchmaking and game-session core for real-time multiplayer games:
//! per-mode queues with wait-time relaxation, balanced match emission, game
//! session lifecycle with per-match action ordering, and Elo settlement into
//! persistent leaderboards.
//!
//! The crate ships in-memory collaborator implementations (storage,
//! transport, bus) for development and testing; a Redis storage adapter is
//! available behind the `redis` feature.
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use matchpoint::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     matchpoint::telemetry::init("matchpoint");
//!
//!     let storage = Arc::new(MemoryStorage::new());
//!     let players = Arc::new(PlayerStore::new(storage.clone()));
//!     let queues = Arc::new(QueueStore::new(storage.clone()));
//!     let transport = Arc::new(ChannelTransport::new());
//!     let fanout = Arc::new(EventFanout::new(transport.clone(), Arc::new(MemoryBus::new())));
//!
//!     let sessions = SessionManager::new(
//!         storage,
//!         players.clone(),
//!         fanout.clone(),
//!         SessionConfig::default(),
//!     );
//!     let engine = MatchmakingEngine::new(
//!         queues.clone(),
//!         sessions.clone(),
//!         fanout.clone(),
//!         EngineConfig::default(),
//!     );
//!     engine.start();
//!
//!     // The socket layer feeds decoded client events into the gateway and
//!     // reports disconnects to it.
//!     let _gateway = ClientGateway::new(players.clone(), queues.clone(), sessions.clone(), fanout);
//!
//!     let app = matchpoint::api::router(matchpoint::api::ApiState { players, queues, sessions });
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod error;
pub mod events;
pub mod gateway;
pub mod matchmaker;
pub mod modes;
pub mod persistence;
pub mod player;
pub mod queue;
pub mod rating;
pub mod session;
pub mod telemetry;

// Re-export commonly used types
pub use error::{MatchpointError, Result};
pub use events::{
    ChannelTransport, ClientTransport, EventBus, EventFanout, GameUpdatePayload, MemoryBus,
    PlayerSummary, ServerEvent,
};
pub use gateway::{ClientEvent, ClientGateway};
pub use matchmaker::{compatible, EngineConfig, MatchmakingEngine};
pub use modes::{GameMode, ModeConfig};
#[cfg(feature = "redis")]
pub use persistence::RedisStorage;
pub use persistence::{MemoryStorage, StorageAdapter};
pub use player::{LeaderboardRow, LeaderboardScope, Player, PlayerStore};
pub use queue::{Preferences, QueueEntry, QueueStats, QueueStore};
pub use rating::{Outcome, DEFAULT_RATING, RATING_FLOOR};
pub use session::{
    EndReason, Game, GameResult, GameStatus, Participant, SessionConfig, SessionManager,
};

/// Prelude module for convenient imports
pub mod prelude;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
