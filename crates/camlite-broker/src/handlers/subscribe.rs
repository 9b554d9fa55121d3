//! SUBSCRIBE and UNSUBSCRIBE handling.

use log::debug;

use ahash::AHashSet;
use camlite_core::packet::{Packet, Suback, Subscribe, Unsubscribe};

use crate::client_handle::ClientHandle;
use crate::shared::SharedState;

pub(crate) fn handle_subscribe(
    subscribe: Subscribe,
    client_id: &str,
    subscriptions: &mut AHashSet<String>,
    shared: &SharedState,
    handle: &ClientHandle,
) -> std::io::Result<()> {
    let mut return_codes = Vec::with_capacity(subscribe.topics.len());
    for (topic, requested_qos) in subscribe.topics {
        debug!(
            "client {} subscribes to {:?} (requested qos {:?}, granted 0)",
            client_id, topic, requested_qos
        );
        shared.subscribe(client_id, &topic);
        subscriptions.insert(topic);
        // Granted QoS is always 0, whatever was requested.
        return_codes.push(0);
    }

    handle.send(&Packet::Suback(Suback {
        packet_id: subscribe.packet_id,
        return_codes,
    }))
}

pub(crate) fn handle_unsubscribe(
    unsubscribe: Unsubscribe,
    client_id: &str,
    subscriptions: &mut AHashSet<String>,
    shared: &SharedState,
    handle: &ClientHandle,
) -> std::io::Result<()> {
    for topic in unsubscribe.topics {
        debug!("client {} unsubscribes from {:?}", client_id, topic);
        // Unsubscribing from a topic never subscribed to is a no-op,
        // acknowledged all the same.
        shared.unsubscribe(client_id, &topic);
        subscriptions.remove(&topic);
    }

    handle.send(&Packet::Unsuback {
        packet_id: unsubscribe.packet_id,
    })
}
