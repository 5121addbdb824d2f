//! Pluggable persistence. The core only ever touches the backing store
//! through [`StorageAdapter`]; key naming and TTLs live in the adapters.

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;
pub mod traits;

pub use memory::MemoryStorage;
#[cfg(feature = "redis")]
pub use redis::RedisStorage;
pub use traits::{StorageAdapter, GAME_TTL_SECS, PLAYER_TTL_SECS, QUEUE_TTL_SECS};
