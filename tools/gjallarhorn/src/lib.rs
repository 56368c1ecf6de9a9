//! Gjallarhorn is the relay server every agent connects to.
//!
//! It hands out agent identities and teams, and relays the frames of one agent to all others.
pub mod error;
pub mod registry;
pub mod server;

pub use error::{Error, Result};
pub use server::Relay;
