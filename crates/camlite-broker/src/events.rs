//! Broker events delivered to the external consumer.

use bytes::Bytes;
use crossbeam_channel::Sender;

/// Events emitted by the broker.
///
/// Events for a single connection arrive in the order their causing
/// packets were received; no ordering is guaranteed across connections.
#[derive(Debug, Clone)]
pub enum BrokerEvent {
    /// A client completed the CONNECT handshake.
    ClientConnected {
        /// Client identifier (server-generated if the client sent none).
        client_id: String,
    },
    /// A client's connection closed, for any reason.
    ClientDisconnected { client_id: String },
    /// A PUBLISH arrived. Emitted for every publish, image or not.
    MessageReceived {
        topic: String,
        payload: Bytes,
        client_id: String,
    },
    /// A PUBLISH payload carried a valid data-URI image.
    ImageReceived {
        client_id: String,
        /// Image format token from the data URI (e.g. "png", "jpeg").
        format: String,
        bytes: Bytes,
    },
}

/// Sending side of the event channel, cloned into every connection.
#[derive(Clone)]
pub(crate) struct EventSink {
    tx: Sender<BrokerEvent>,
}

impl EventSink {
    pub(crate) fn new(tx: Sender<BrokerEvent>) -> Self {
        Self { tx }
    }

    /// Emit an event. A dropped receiver is not an error: the broker
    /// keeps serving clients even when nobody is listening.
    pub(crate) fn emit(&self, event: BrokerEvent) {
        let _ = self.tx.send(event);
    }
}
