//! Bifrost is the line protocol used between the relay server and the soccer agents.
//!
//! Every frame is a single UTF-8 line of pipe-delimited fields, with an uppercase type tag as
//! the first field, e.g. `BALL|1.000|2.000|0.000`. Frames are decoded once at the boundary into
//! the closed [`communication::Message`] union.
pub mod communication;
pub mod serialization;

mod error;
pub use error::{Error, Result};
