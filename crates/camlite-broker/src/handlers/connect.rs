//! CONNECT handling: handshake validation, session takeover, CONNACK.

use std::sync::Arc;

use log::{debug, info, warn};

use camlite_core::packet::{Connack, ConnackCode, Connect, Packet};

use crate::client_handle::ClientHandle;
use crate::events::{BrokerEvent, EventSink};
use crate::shared::SharedState;

/// Outcome of the CONNECT handshake.
pub(crate) enum ConnectOutcome {
    /// Handshake accepted; the connection is established under this id.
    Accepted { client_id: String },
    /// CONNACK with a non-zero code was sent; close the connection.
    Rejected,
}

pub(crate) fn handle(
    connect: Connect,
    handle: &Arc<ClientHandle>,
    shared: &SharedState,
    events: &EventSink,
) -> std::io::Result<ConnectOutcome> {
    // Protocol name or level mismatch gets an explicit CONNACK 0x01
    // before the close, so conformant clients see a clean rejection
    // instead of a dropped socket.
    if connect.protocol_name != "MQTT" || connect.protocol_level != 4 {
        warn!(
            "rejecting CONNECT: protocol {:?} level {}",
            connect.protocol_name, connect.protocol_level
        );
        handle.send(&Packet::Connack(Connack {
            session_present: false,
            code: ConnackCode::UnacceptableProtocolVersion,
        }))?;
        return Ok(ConnectOutcome::Rejected);
    }

    let client_id = if connect.client_id.is_empty() {
        let generated = shared.generate_client_id();
        debug!("empty client id, generated {}", generated);
        generated
    } else {
        connect.client_id
    };

    // Last writer wins: a second CONNECT with a live id evicts the
    // previous connection. Its subscriptions go with it; the new
    // session starts clean.
    if let Some(evicted) = shared.register(&client_id, Arc::clone(handle)) {
        info!("session takeover for {}, closing previous connection", client_id);
        evicted.shutdown();
        shared.remove_all_subscriptions(&client_id);
    }

    handle.set_keep_alive(connect.keep_alive);

    handle.send(&Packet::Connack(Connack {
        session_present: false,
        code: ConnackCode::Accepted,
    }))?;

    info!(
        "client {} connected (keep-alive {}s)",
        client_id, connect.keep_alive
    );
    events.emit(BrokerEvent::ClientConnected {
        client_id: client_id.clone(),
    });

    Ok(ConnectOutcome::Accepted { client_id })
}
