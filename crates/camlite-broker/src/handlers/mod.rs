//! Per-packet handlers.
//!
//! Each handler takes decoded packet data plus the connection's view of
//! shared state, performs the protocol action, and writes any response
//! through the connection's [`ClientHandle`].

pub(crate) mod connect;
pub(crate) mod publish;
pub(crate) mod subscribe;
