//! camlite-core - MQTT 3.1.1 wire types and codec.
//!
//! This crate provides the protocol layer of the camlite broker: the
//! remaining-length varint codec, the incremental frame reader, and the
//! packet decoder/encoder. It performs no I/O; the broker crate feeds it
//! bytes and writes out what it encodes.

pub mod error;
pub mod frame;
pub mod packet;
pub mod varint;

pub use error::{Error, ProtocolError, Result};
pub use frame::{Frame, FrameReader};
pub use packet::*;
