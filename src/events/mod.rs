//! Event fan-out: translation of core events into per-participant transport
//! sends and best-effort bus publishes.

pub mod bus;
pub mod fanout;
pub mod transport;

pub use bus::{
    connect_with_retry, routing, BusMessage, EventBus, MemoryBus, GAME_EVENTS_EXCHANGE,
    MATCHMAKING_EXCHANGE,
};
pub use fanout::EventFanout;
pub use transport::{
    ChannelTransport, ChessMove, ClientTransport, GameUpdatePayload, PlayerSummary, ServerEvent,
};
