//! Keep-alive supervision.
//!
//! A single supervisor thread sweeps the session registry on a fixed
//! interval and shuts down any connection silent for longer than 1.5x
//! its declared keep-alive (MQTT 3.1.1 grace factor). The shutdown
//! unblocks that connection's reader thread, which then runs the normal
//! teardown path, so expiry looks exactly like a peer disconnect from
//! the consumer's point of view.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::warn;

use crate::shared::SharedState;

const GRACE_FACTOR: f64 = 1.5;

pub(crate) fn spawn(
    shared: Arc<SharedState>,
    shutdown: Arc<AtomicBool>,
    interval: Duration,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("keepalive".to_string())
        .spawn(move || run(&shared, &shutdown, interval))
}

fn run(shared: &SharedState, shutdown: &AtomicBool, interval: Duration) {
    while !shutdown.load(Ordering::SeqCst) {
        thread::sleep(interval);
        sweep(shared);
    }
}

fn sweep(shared: &SharedState) {
    for (client_id, handle) in shared.all_clients() {
        let keep_alive = handle.keep_alive();
        // Keep-alive 0 means the client opted out of the check.
        if keep_alive == 0 || handle.is_closed() {
            continue;
        }
        let limit = f64::from(keep_alive) * GRACE_FACTOR;
        let idle = handle.idle_secs();
        if idle > limit {
            warn!(
                "client {} keep-alive expired ({:.1}s idle, limit {:.1}s), closing",
                client_id, idle, limit
            );
            handle.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client_handle::ClientHandle;
    use std::net::{TcpListener, TcpStream};

    fn test_handle() -> Arc<ClientHandle> {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let _client = TcpStream::connect(addr).unwrap();
        let (server, _) = listener.accept().unwrap();
        Arc::new(ClientHandle::new(server))
    }

    #[test]
    fn test_sweep_ignores_zero_keep_alive() {
        let shared = SharedState::new();
        let handle = test_handle();
        handle.set_keep_alive(0);
        shared.register("quiet", Arc::clone(&handle));

        sweep(&shared);
        assert!(!handle.is_closed());
    }

    #[test]
    fn test_sweep_closes_expired_connection() {
        let shared = SharedState::new();
        let handle = test_handle();
        handle.set_keep_alive(1);
        shared.register("stale", Arc::clone(&handle));

        // Fresh activity keeps it alive.
        sweep(&shared);
        assert!(!handle.is_closed());

        // 1.6s exceeds the 1.5s limit for keep-alive 1.
        std::thread::sleep(Duration::from_millis(1600));
        sweep(&shared);
        assert!(handle.is_closed());
    }
}
