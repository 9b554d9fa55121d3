//! PUBLISH handling: event emission and image extraction.
//!
//! Inbound publishes are not relayed to subscribers; they surface as
//! events for the external consumer. QoS 1/2 flags are tolerated but
//! never acknowledged, so the effective delivery contract is QoS 0.

use log::{debug, trace};

use camlite_core::packet::Publish;

use crate::config::ImageConfig;
use crate::events::{BrokerEvent, EventSink};
use crate::image;

pub(crate) fn handle(publish: Publish, client_id: &str, image_cfg: &ImageConfig, events: &EventSink) {
    trace!(
        "PUBLISH from {} on {:?} ({} bytes, qos {:?})",
        client_id,
        publish.topic,
        publish.payload.len(),
        publish.qos
    );

    // Every publish surfaces as a message event, image or not.
    events.emit(BrokerEvent::MessageReceived {
        topic: publish.topic.clone(),
        payload: publish.payload.clone(),
        client_id: client_id.to_string(),
    });

    if !image_cfg.applies_to(&publish.topic) {
        return;
    }

    // Payloads that are not data URIs pass through silently; payloads
    // that claim to be but fail base64 decoding are dropped with a log
    // line, never a connection error.
    match image::extract(&publish.payload) {
        Ok(Some(decoded)) => {
            debug!(
                "image from {} on {:?}: {} ({} bytes)",
                client_id,
                publish.topic,
                decoded.format,
                decoded.bytes.len()
            );
            events.emit(BrokerEvent::ImageReceived {
                client_id: client_id.to_string(),
                format: decoded.format,
                bytes: decoded.bytes,
            });
        }
        Ok(None) => {}
        Err(e) => {
            debug!("discarding invalid image payload from {}: {}", client_id, e);
        }
    }
}
