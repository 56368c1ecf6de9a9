//! Identifiers and messages exchanged between the relay and the agents.
mod message;
mod types;

pub use message::{BallPosition, Freshness, Message, MessageKind, PositionReport, StateReport};
pub use types::{AgentId, MotionState, Role, TeamNumber};

/// The address the relay binds to when nothing else is configured.
pub const DEFAULT_RELAY_HOST: &str = "127.0.0.1";

/// The port the relay listens on when nothing else is configured.
pub const DEFAULT_RELAY_PORT: u16 = 5555;
