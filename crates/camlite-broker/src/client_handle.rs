//! Cross-thread client socket handle.
//!
//! Each connection is owned by exactly one reader thread, but two other
//! parties need access to its socket: the consumer's outbound `publish`
//! (writes) and the keep-alive supervisor plus session takeover
//! (shutdown). The handle serializes writes under a mutex and exposes
//! shutdown, which is the sole cancellation mechanism: it unblocks the
//! owning thread's pending read and drives the state machine to closed.

use std::cell::RefCell;
use std::io::Write;
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::time::Instant;

use parking_lot::Mutex;

use camlite_core::packet::{self, Packet};

// Thread-local buffer for packet encoding (avoids allocation per packet).
thread_local! {
    static ENCODE_BUF: RefCell<Vec<u8>> = RefCell::new(Vec::with_capacity(256));
}

pub(crate) struct ClientHandle {
    stream: TcpStream,
    /// Serializes writes from the connection thread and from
    /// `BrokerHandle::publish` callers.
    write_lock: Mutex<()>,
    closed: AtomicBool,
    /// Keep-alive interval the client declared in CONNECT. 0 disables
    /// the keep-alive check for this connection.
    keep_alive_secs: AtomicU16,
    /// Last time any packet arrived on this connection.
    last_activity: Mutex<Instant>,
}

impl ClientHandle {
    pub(crate) fn new(stream: TcpStream) -> Self {
        Self {
            stream,
            write_lock: Mutex::new(()),
            closed: AtomicBool::new(false),
            keep_alive_secs: AtomicU16::new(0),
            last_activity: Mutex::new(Instant::now()),
        }
    }

    /// Write an encoded packet to the socket.
    pub(crate) fn write_packet(&self, bytes: &[u8]) -> std::io::Result<()> {
        let _guard = self.write_lock.lock();
        (&self.stream).write_all(bytes)
    }

    /// Encode and write a control packet.
    pub(crate) fn send(&self, packet: &Packet) -> std::io::Result<()> {
        ENCODE_BUF.with(|buf| {
            let mut buf = buf.borrow_mut();
            buf.clear();
            packet::encode_packet(packet, &mut buf);
            self.write_packet(&buf)
        })
    }

    /// Shut the socket down in both directions. Idempotent.
    ///
    /// This unblocks a read pending in the connection's own thread; that
    /// thread then performs the actual teardown bookkeeping.
    pub(crate) fn shutdown(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            let _ = self.stream.shutdown(Shutdown::Both);
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn set_keep_alive(&self, secs: u16) {
        self.keep_alive_secs.store(secs, Ordering::Relaxed);
    }

    pub(crate) fn keep_alive(&self) -> u16 {
        self.keep_alive_secs.load(Ordering::Relaxed)
    }

    /// Refresh the activity timestamp. Called for every inbound packet,
    /// PINGREQ included.
    pub(crate) fn touch(&self) {
        *self.last_activity.lock() = Instant::now();
    }

    /// Seconds since the last inbound packet.
    pub(crate) fn idle_secs(&self) -> f64 {
        self.last_activity.lock().elapsed().as_secs_f64()
    }
}
