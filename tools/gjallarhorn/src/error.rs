use std::net::SocketAddr;

use miette::Diagnostic;
use thiserror::Error;

/// Type alias for [`std::result::Result`] containing a gjallarhorn [`enum@Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Enum describing the possible errors that can occur in the relay.
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    #[error("Failed to bind the relay to {address}")]
    #[diagnostic(
        code(relay::bind),
        help(
            "- Is another relay already listening on this port?
- Is the address assigned to one of this machine's interfaces?"
        )
    )]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Connection with {address} failed")]
    Connection {
        address: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Protocol(#[from] bifrost::Error),
}
