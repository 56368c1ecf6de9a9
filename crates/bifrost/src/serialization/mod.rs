//! Conversion between [`Message`](crate::communication::Message)s and the frames carrying them.
//!
//! A frame is one line of text: the type tag followed by the fields of the message, all
//! separated by a `|`. Floating point fields are written with three decimals.
mod frame;
#[cfg(feature = "tokio")]
pub mod stream;

use std::io::Write;

use crate::Result;

pub use frame::SEPARATOR;

/// Trait for types that can be written as a single frame.
pub trait Encode {
    /// Writes the frame for `self` to `write`, terminated by a newline.
    fn encode(&self, write: impl Write) -> Result<()>;

    /// Number of bytes [`Encode::encode`] writes, including the newline.
    fn encode_len(&self) -> usize;
}

/// Trait for types that can be read back from a single frame.
pub trait Decode: Sized {
    /// Decodes one frame. Surrounding whitespace, including the line terminator, is ignored.
    fn decode(frame: &str) -> Result<Self>;
}
