//! Per-connection state machine and blocking read loop.
//!
//! Each accepted socket gets its own thread running [`Connection::run`].
//! The connection moves through three states: awaiting CONNECT,
//! established, closed. Any protocol violation, framing error, or I/O
//! failure drives it straight to closed; there is no error recovery on
//! a broken stream.

use std::io::{self, Read};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;

use ahash::AHashSet;
use log::{debug, info, trace};

use camlite_core::packet::{self, Packet};
use camlite_core::{Error, FrameReader, ProtocolError};

use crate::client_handle::ClientHandle;
use crate::config::ImageConfig;
use crate::events::{BrokerEvent, EventSink};
use crate::handlers;
use crate::handlers::connect::ConnectOutcome;
use crate::shared::SharedState;

const READ_BUF_SIZE: usize = 8192;

enum State {
    AwaitingConnect,
    Established,
}

/// What the read loop should do after a packet was handled.
enum Flow {
    Continue,
    /// Orderly end of session (DISCONNECT, or a rejecting CONNACK).
    Stop,
}

pub(crate) struct Connection {
    stream: TcpStream,
    addr: SocketAddr,
    state: State,
    /// Empty until the CONNECT handshake completes.
    client_id: String,
    /// Topics this connection subscribed to, for the teardown log line.
    subscriptions: AHashSet<String>,
    frames: FrameReader,
    handle: Arc<ClientHandle>,
    shared: Arc<SharedState>,
    events: EventSink,
    image_cfg: ImageConfig,
}

impl Connection {
    pub(crate) fn new(
        stream: TcpStream,
        addr: SocketAddr,
        handle: Arc<ClientHandle>,
        shared: Arc<SharedState>,
        events: EventSink,
        max_packet_size: usize,
        image_cfg: ImageConfig,
    ) -> Self {
        Self {
            stream,
            addr,
            state: State::AwaitingConnect,
            client_id: String::new(),
            subscriptions: AHashSet::new(),
            frames: FrameReader::new(max_packet_size),
            handle,
            shared,
            events,
            image_cfg,
        }
    }

    /// Read loop; runs until the socket closes or a protocol violation.
    ///
    /// The only way to cancel it from outside is
    /// [`ClientHandle::shutdown`], which makes the pending `read` return
    /// and the loop fall through to teardown.
    pub(crate) fn run(mut self) {
        let mut buf = [0u8; READ_BUF_SIZE];
        'outer: loop {
            let n = match self.stream.read(&mut buf) {
                Ok(0) => {
                    trace!("{}: peer closed", self.addr);
                    break;
                }
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!("{}: read error: {}", self.addr, e);
                    break;
                }
            };
            self.frames.extend(&buf[..n]);

            // Drain every complete frame the buffer now holds; a read
            // may carry several packets, or only part of one.
            loop {
                match self.frames.next_frame() {
                    Ok(Some(frame)) => match self.handle_frame(&frame) {
                        Ok(Flow::Continue) => {}
                        Ok(Flow::Stop) => break 'outer,
                        Err(e) => {
                            debug!("{} ({}): closing: {}", self.addr, self.id_for_log(), e);
                            break 'outer;
                        }
                    },
                    Ok(None) => break,
                    Err(e) => {
                        debug!("{} ({}): framing error: {}", self.addr, self.id_for_log(), e);
                        break 'outer;
                    }
                }
            }
        }
        self.teardown();
    }

    fn handle_frame(&mut self, frame: &camlite_core::Frame) -> Result<Flow, Error> {
        let pkt = packet::decode_frame(frame)?;
        self.handle.touch();
        trace!("{} ({}): {} received", self.addr, self.id_for_log(), pkt.name());

        match self.state {
            State::AwaitingConnect => match pkt {
                Packet::Connect(connect) => {
                    match handlers::connect::handle(connect, &self.handle, &self.shared, &self.events)? {
                        ConnectOutcome::Accepted { client_id } => {
                            self.client_id = client_id;
                            self.state = State::Established;
                            Ok(Flow::Continue)
                        }
                        ConnectOutcome::Rejected => Ok(Flow::Stop),
                    }
                }
                other => {
                    debug!("{}: first packet was {}, not CONNECT", self.addr, other.name());
                    Err(ProtocolError::FirstPacketNotConnect.into())
                }
            },
            State::Established => match pkt {
                Packet::Connect(_) => Err(ProtocolError::DuplicateConnect.into()),
                Packet::Publish(publish) => {
                    handlers::publish::handle(publish, &self.client_id, &self.image_cfg, &self.events);
                    Ok(Flow::Continue)
                }
                Packet::Subscribe(subscribe) => {
                    handlers::subscribe::handle_subscribe(
                        subscribe,
                        &self.client_id,
                        &mut self.subscriptions,
                        &self.shared,
                        &self.handle,
                    )?;
                    Ok(Flow::Continue)
                }
                Packet::Unsubscribe(unsubscribe) => {
                    handlers::subscribe::handle_unsubscribe(
                        unsubscribe,
                        &self.client_id,
                        &mut self.subscriptions,
                        &self.shared,
                        &self.handle,
                    )?;
                    Ok(Flow::Continue)
                }
                Packet::Pingreq => {
                    self.handle.send(&Packet::Pingresp)?;
                    Ok(Flow::Continue)
                }
                Packet::Disconnect => {
                    debug!("client {} sent DISCONNECT", self.client_id);
                    Ok(Flow::Stop)
                }
                other => Err(ProtocolError::UnexpectedPacket(other.name()).into()),
            },
        }
    }

    /// Unconditional exit path; runs exactly once, whatever ended the loop.
    fn teardown(&mut self) {
        self.handle.shutdown();

        if self.client_id.is_empty() {
            // Never completed the handshake; nothing was registered.
            debug!("{}: connection closed before CONNECT completed", self.addr);
            return;
        }

        // An evicted connection is no longer the registered owner of its
        // id; its successor's registration and subscriptions stay put and
        // no disconnect event is emitted for it.
        if self.shared.unregister_if_owner(&self.client_id, &self.handle) {
            self.shared.remove_all_subscriptions(&self.client_id);
            info!(
                "client {} disconnected ({} subscriptions dropped)",
                self.client_id,
                self.subscriptions.len()
            );
            self.events.emit(BrokerEvent::ClientDisconnected {
                client_id: std::mem::take(&mut self.client_id),
            });
        } else {
            debug!("client {} superseded by takeover, teardown skipped", self.client_id);
        }
    }

    fn id_for_log(&self) -> &str {
        if self.client_id.is_empty() {
            "unidentified"
        } else {
            &self.client_id
        }
    }
}
