//! The matchmaking engine: compatibility scoring with wait-time relaxation
//! and the periodic per-mode tick that turns queues into matches.

pub mod compat;
pub mod engine;

pub use compat::{compatible, max_rating_gap};
pub use engine::{EngineConfig, MatchmakingEngine};
