//! Prelude module with commonly used types and traits
//!
//! Import this module to get all the essential types for using Matchpoint:
//!
//! ```rust
//! use matchpoint::prelude::*;
//! ```

pub use crate::{
    api::{router, ApiState},
    error::{MatchpointError, Result},
    events::{
        ChannelTransport, ClientTransport, EventBus, EventFanout, GameUpdatePayload, MemoryBus,
        PlayerSummary, ServerEvent,
    },
    gateway::{ClientEvent, ClientGateway},
    matchmaker::{EngineConfig, MatchmakingEngine},
    modes::{GameMode, ModeConfig},
    persistence::{MemoryStorage, StorageAdapter},
    player::{LeaderboardRow, LeaderboardScope, Player, PlayerStore},
    queue::{Preferences, QueueEntry, QueueStats, QueueStore},
    rating::{Outcome, DEFAULT_RATING, RATING_FLOOR},
    session::{EndReason, Game, GameResult, GameStatus, Participant, SessionConfig, SessionManager},
};

#[cfg(feature = "redis")]
pub use crate::persistence::RedisStorage;

// Re-export common external dependencies
pub use async_trait::async_trait;
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use uuid::Uuid;
