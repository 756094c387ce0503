//! Compact binary encoding of glove pairs
//!
//! - [`frame`]: byte layout, parsing and validation
//! - [`delta`]: stateful encoder/decoder deciding full vs delta frames

pub mod delta;
pub mod frame;

pub use delta::{DeltaDecoder, DeltaEncoder, SessionClock};
pub use frame::{FULL_MASK, Frame, HEADER_SIZE};
