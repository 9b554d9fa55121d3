//! Error types for camlite.

use std::io;

use thiserror::Error;

/// Main error type for camlite.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// MQTT protocol errors.
///
/// Every variant is fatal to the connection that produced it: the broker
/// closes the socket without a response and never retries. None of them
/// are fatal to the broker process.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid packet type: {0}")]
    InvalidPacketType(u8),

    #[error("Invalid remaining length encoding")]
    InvalidRemainingLength,

    #[error("Frame body of {size} bytes exceeds limit of {max}")]
    FrameTooLarge { size: usize, max: usize },

    #[error("Incomplete packet: need {needed} bytes, have {have}")]
    IncompletePacket { needed: usize, have: usize },

    #[error("Invalid connect flags: {0:#04x}")]
    InvalidConnectFlags(u8),

    #[error("Invalid UTF-8 string")]
    InvalidUtf8,

    #[error("Malformed packet: {0}")]
    MalformedPacket(String),

    #[error("First packet must be CONNECT")]
    FirstPacketNotConnect,

    #[error("Duplicate CONNECT on an established connection")]
    DuplicateConnect,

    #[error("Unexpected {0} packet from client")]
    UnexpectedPacket(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
