//! Reading frames off an async byte stream.
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use super::Decode;
use crate::{Error, Result, communication::Message};

/// Longest frame accepted, in bytes, not counting the newline.
pub const MAX_FRAME_LEN: usize = 1024;

/// Splits a byte stream into frames and decodes them.
///
/// Each frame is decoded on its own. A frame that is too long, not UTF-8 or not a valid
/// message is reported as an error, and reading continues with the next line.
pub struct FrameReader<R> {
    reader: R,
    buffer: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin> FrameReader<R> {
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::with_capacity(MAX_FRAME_LEN + 1),
        }
    }

    /// Reads the next non-empty frame.
    ///
    /// Returns `Ok(None)` once the stream is closed. Only errors of the stream itself are
    /// returned as the outer error.
    pub async fn next_frame(&mut self) -> std::io::Result<Option<Result<Message>>> {
        loop {
            self.buffer.clear();
            let limit = MAX_FRAME_LEN as u64 + 1;
            let read = (&mut self.reader)
                .take(limit)
                .read_until(b'\n', &mut self.buffer)
                .await?;
            if read == 0 {
                return Ok(None);
            }

            if self.buffer.last() != Some(&b'\n') && self.buffer.len() > MAX_FRAME_LEN {
                self.skip_line().await?;
                return Ok(Some(Err(Error::FrameTooLong {
                    limit: MAX_FRAME_LEN,
                })));
            }

            let frame = match std::str::from_utf8(&self.buffer) {
                Ok(frame) => frame,
                Err(error) => return Ok(Some(Err(Error::InvalidUtf8(error)))),
            };
            if frame.trim().is_empty() {
                continue;
            }

            return Ok(Some(Message::decode(frame)));
        }
    }

    /// Discards everything up to and including the next newline.
    async fn skip_line(&mut self) -> std::io::Result<()> {
        loop {
            let (consumed, done) = {
                let available = self.reader.fill_buf().await?;
                if available.is_empty() {
                    return Ok(());
                }

                match available.iter().position(|&byte| byte == b'\n') {
                    Some(newline) => (newline + 1, true),
                    None => (available.len(), false),
                }
            };

            self.reader.consume(consumed);
            if done {
                return Ok(());
            }
        }
    }
}
