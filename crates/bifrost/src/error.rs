//! Result and Error types for the crate.
use thiserror::Error;

/// Result containing an error variant from this module.
pub type Result<T> = std::result::Result<T, Error>;

/// Protocol error variants
#[derive(Error, Debug)]
pub enum Error {
    /// IO error, this wraps a [std::io::Error]
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The line is longer than any valid frame.
    #[error("frame exceeds {limit} bytes")]
    FrameTooLong { limit: usize },

    /// The line is not valid UTF-8.
    #[error("frame is not valid UTF-8")]
    InvalidUtf8(#[source] std::str::Utf8Error),

    /// The line did not contain anything besides whitespace.
    #[error("received an empty frame")]
    EmptyFrame,

    /// The type tag of the frame is not part of the protocol.
    #[error("unknown message type `{0}`")]
    UnknownTag(String),

    /// A required field is absent.
    #[error("`{tag}` frame is missing field `{field}`")]
    MissingField {
        tag: &'static str,
        field: &'static str,
    },

    /// A field is present but could not be parsed.
    #[error("`{tag}` frame has an invalid `{field}`: `{value}`")]
    InvalidField {
        tag: &'static str,
        field: &'static str,
        value: String,
    },

    /// The frame has more fields than its type allows.
    #[error("`{tag}` frame has {count} unexpected trailing field(s)")]
    TrailingFields { tag: &'static str, count: usize },

    /// Agent ids may not be empty, and may not contain the field or frame separators.
    #[error("invalid agent id `{0}`")]
    InvalidAgentId(String),
}

impl Error {
    /// Whether this error was caused by a frame type this side of the protocol does not know.
    #[must_use]
    pub fn is_unknown_tag(&self) -> bool {
        matches!(self, Error::UnknownTag(_))
    }
}
