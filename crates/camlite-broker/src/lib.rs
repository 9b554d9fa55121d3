//! camlite-broker - MQTT 3.1.1 subset broker for camera image collection.
//!
//! The broker accepts standard-conformant MQTT clients over raw TCP,
//! decodes the CONNECT/PUBLISH/SUBSCRIBE/UNSUBSCRIBE/PINGREQ/DISCONNECT
//! subset, and surfaces everything that happens through a channel of
//! [`BrokerEvent`]s. PUBLISH payloads carrying the
//! `data:image/<fmt>;base64,` convention are decoded into raw image
//! bytes for the consumer (typically an inference/UI layer).
//!
//! Client-originated publishes are not fanned out to other subscribers:
//! this broker is a collection point, not a relay. The consumer can push
//! outbound messages to subscribed clients via
//! [`BrokerHandle::publish`].

pub mod config;
pub mod events;
pub mod image;

mod client_handle;
mod connection;
mod handlers;
mod keepalive;
mod server;
mod shared;

pub use config::Config;
pub use events::BrokerEvent;
pub use server::{Broker, BrokerHandle};
