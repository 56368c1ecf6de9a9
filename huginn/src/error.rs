//! Result and Error types for the crate.
use std::net::SocketAddr;

use thiserror::Error;

/// Result containing an error variant from this module.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to connect to the relay at {address}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("connection with the relay at {address} failed")]
    Connection {
        address: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] odal::Error),

    #[error(transparent)]
    Protocol(#[from] bifrost::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
