//! Broker lifecycle: listener, accept loop, consumer handle.

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use bytes::Bytes;
use crossbeam_channel::{unbounded, Receiver};
use log::{debug, error, info, warn};
use parking_lot::Mutex;

use camlite_core::packet::{encode_publish, Publish, QoS};

use crate::client_handle::ClientHandle;
use crate::config::Config;
use crate::connection::Connection;
use crate::events::{BrokerEvent, EventSink};
use crate::keepalive;
use crate::shared::SharedState;

/// The broker entry point.
pub struct Broker;

impl Broker {
    /// Bind the listener and start the accept loop and keep-alive
    /// supervisor.
    ///
    /// Returns a [`BrokerHandle`] for the consumer and the receiving end
    /// of the event channel. The broker runs until
    /// [`BrokerHandle::shutdown`] is called.
    pub fn start(config: Config) -> io::Result<(BrokerHandle, Receiver<BrokerEvent>)> {
        let listener = TcpListener::bind(config.server.bind)?;
        let local_addr = listener.local_addr()?;
        info!("listening on {}", local_addr);

        let shared = Arc::new(SharedState::new());
        let shutdown = Arc::new(AtomicBool::new(false));
        let (tx, rx) = unbounded();
        let events = EventSink::new(tx);

        let supervisor = keepalive::spawn(
            Arc::clone(&shared),
            Arc::clone(&shutdown),
            Duration::from_secs(config.session.sweep_interval_secs),
        )?;

        let acceptor = {
            let shared = Arc::clone(&shared);
            let shutdown = Arc::clone(&shutdown);
            thread::Builder::new()
                .name("acceptor".to_string())
                .spawn(move || accept_loop(&listener, &config, &shared, &events, &shutdown))?
        };

        Ok((
            BrokerHandle {
                shared,
                shutdown,
                local_addr,
                threads: Mutex::new(vec![acceptor, supervisor]),
            },
            rx,
        ))
    }
}

fn accept_loop(
    listener: &TcpListener,
    config: &Config,
    shared: &Arc<SharedState>,
    events: &EventSink,
    shutdown: &AtomicBool,
) {
    loop {
        match listener.accept() {
            Ok((stream, addr)) => {
                if shutdown.load(Ordering::SeqCst) {
                    break;
                }
                if shared.client_count() >= config.limits.max_connections {
                    warn!(
                        "connection limit ({}) reached, dropping {}",
                        config.limits.max_connections, addr
                    );
                    continue;
                }
                if let Err(e) = spawn_connection(stream, addr, config, shared, events) {
                    error!("failed to start connection thread for {}: {}", addr, e);
                }
            }
            Err(e) => {
                if shutdown.load(Ordering::SeqCst) {
                    break;
                }
                error!("accept failed: {}", e);
                thread::sleep(Duration::from_millis(100));
            }
        }
    }
    debug!("acceptor stopped");
}

fn spawn_connection(
    stream: TcpStream,
    addr: SocketAddr,
    config: &Config,
    shared: &Arc<SharedState>,
    events: &EventSink,
) -> io::Result<()> {
    stream.set_nodelay(true)?;
    debug!("accepted connection from {}", addr);

    // The handle keeps its own clone of the socket so writers and the
    // supervisor never touch the reader thread's end.
    let handle = Arc::new(ClientHandle::new(stream.try_clone()?));
    let conn = Connection::new(
        stream,
        addr,
        handle,
        Arc::clone(shared),
        events.clone(),
        config.limits.max_packet_size,
        config.image.clone(),
    );

    thread::Builder::new()
        .name(format!("conn-{}", addr))
        .spawn(move || conn.run())?;
    Ok(())
}

/// Consumer-facing handle to a running broker.
pub struct BrokerHandle {
    shared: Arc<SharedState>,
    shutdown: Arc<AtomicBool>,
    local_addr: SocketAddr,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

impl BrokerHandle {
    /// The address the broker is actually listening on. Useful when the
    /// configured bind port was 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Ids of currently connected clients, in no particular order.
    pub fn connected_clients(&self) -> Vec<String> {
        self.shared.client_ids()
    }

    /// Send a QoS 0 PUBLISH to every client subscribed to `topic`.
    ///
    /// This is the only fan-out path in the broker; client-originated
    /// publishes never reach other clients. Returns the number of
    /// clients the message was written to. A client whose write fails
    /// is shut down and not counted.
    pub fn publish(&self, topic: &str, payload: &[u8]) -> usize {
        let subscribers = self.shared.subscribers_of(topic);
        if subscribers.is_empty() {
            return 0;
        }

        // Encode once, write to each subscriber.
        let packet = Publish {
            dup: false,
            qos: QoS::AtMostOnce,
            retain: false,
            topic: topic.to_string(),
            packet_id: None,
            payload: Bytes::copy_from_slice(payload),
        };
        let mut buf = Vec::with_capacity(payload.len() + topic.len() + 8);
        encode_publish(&packet, &mut buf);

        let mut delivered = 0;
        for (client_id, handle) in subscribers {
            match handle.write_packet(&buf) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!("publish to {} failed: {}, closing", client_id, e);
                    handle.shutdown();
                }
            }
        }
        delivered
    }

    /// Stop accepting, close every live connection, and join the broker
    /// threads. Idempotent.
    pub fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("shutting down");

        // The acceptor is blocked in accept(); a throwaway connection
        // wakes it so it can observe the flag.
        let mut wake_addr = self.local_addr;
        if wake_addr.ip().is_unspecified() {
            wake_addr.set_ip(IpAddr::V4(Ipv4Addr::LOCALHOST));
        }
        let _ = TcpStream::connect(wake_addr);

        for (_, handle) in self.shared.all_clients() {
            handle.shutdown();
        }

        for thread in self.threads.lock().drain(..) {
            let _ = thread.join();
        }
        info!("shutdown complete");
    }
}
