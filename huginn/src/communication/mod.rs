//! Everything between the tick loop and the relay.
pub mod connection;
pub mod sync;

pub use connection::RelayConnection;
pub use sync::StateReporter;
