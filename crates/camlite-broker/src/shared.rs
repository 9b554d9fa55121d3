//! State shared across connection threads.
//!
//! Two maps make up the whole of the broker's cross-connection state:
//! the session registry (client id → live connection handle) and the
//! topic table (exact topic string → subscribed client ids). Both sit
//! behind `parking_lot` RwLocks; every mutation takes the write lock, so
//! dispatch reads always observe a consistent snapshot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use parking_lot::RwLock;

use crate::client_handle::ClientHandle;

pub(crate) struct SharedState {
    /// Session registry: at most one live connection per client id.
    clients: RwLock<AHashMap<String, Arc<ClientHandle>>>,
    /// Topic table: topic filter → subscribed client ids.
    topics: RwLock<AHashMap<String, AHashSet<String>>>,
    /// Counter for server-generated client ids.
    next_client_num: AtomicU64,
}

impl SharedState {
    pub(crate) fn new() -> Self {
        Self {
            clients: RwLock::new(AHashMap::new()),
            topics: RwLock::new(AHashMap::new()),
            next_client_num: AtomicU64::new(1),
        }
    }

    /// Generate an identifier for a client that connected with an empty one.
    pub(crate) fn generate_client_id(&self) -> String {
        let n = self.next_client_num.fetch_add(1, Ordering::Relaxed);
        format!("client-{}", n)
    }

    /// Register a connection under its client id.
    ///
    /// Returns the previously registered handle if the id was taken;
    /// the caller shuts that connection down (last-writer-wins eviction).
    pub(crate) fn register(
        &self,
        client_id: &str,
        handle: Arc<ClientHandle>,
    ) -> Option<Arc<ClientHandle>> {
        self.clients.write().insert(client_id.to_string(), handle)
    }

    /// Remove a registration, but only if `handle` still owns it.
    ///
    /// An evicted connection races its own teardown against the takeover
    /// that replaced it; the pointer check keeps it from deregistering
    /// its successor.
    pub(crate) fn unregister_if_owner(&self, client_id: &str, handle: &Arc<ClientHandle>) -> bool {
        let mut clients = self.clients.write();
        match clients.get(client_id) {
            Some(current) if Arc::ptr_eq(current, handle) => {
                clients.remove(client_id);
                true
            }
            _ => false,
        }
    }

    pub(crate) fn subscribe(&self, client_id: &str, topic: &str) {
        self.topics
            .write()
            .entry(topic.to_string())
            .or_default()
            .insert(client_id.to_string());
    }

    pub(crate) fn unsubscribe(&self, client_id: &str, topic: &str) {
        let mut topics = self.topics.write();
        if let Some(subscribers) = topics.get_mut(topic) {
            subscribers.remove(client_id);
            if subscribers.is_empty() {
                topics.remove(topic);
            }
        }
    }

    /// Remove a client id from every topic table entry.
    pub(crate) fn remove_all_subscriptions(&self, client_id: &str) {
        let mut topics = self.topics.write();
        topics.retain(|_, subscribers| {
            subscribers.remove(client_id);
            !subscribers.is_empty()
        });
    }

    /// Live connection handles subscribed to the exact topic string.
    pub(crate) fn subscribers_of(&self, topic: &str) -> Vec<(String, Arc<ClientHandle>)> {
        let topics = self.topics.read();
        let Some(ids) = topics.get(topic) else {
            return Vec::new();
        };
        let clients = self.clients.read();
        ids.iter()
            .filter_map(|id| clients.get(id).map(|h| (id.clone(), Arc::clone(h))))
            .collect()
    }

    /// Snapshot of all registered connections, for the keep-alive sweep.
    pub(crate) fn all_clients(&self) -> Vec<(String, Arc<ClientHandle>)> {
        self.clients
            .read()
            .iter()
            .map(|(id, h)| (id.clone(), Arc::clone(h)))
            .collect()
    }

    /// Snapshot of connected client ids.
    pub(crate) fn client_ids(&self) -> Vec<String> {
        self.clients.read().keys().cloned().collect()
    }

    pub(crate) fn client_count(&self) -> usize {
        self.clients.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{TcpListener, TcpStream};

    /// A connected socket pair; the handle side wraps the accepted end.
    fn test_handle() -> Arc<ClientHandle> {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let _client = TcpStream::connect(addr).unwrap();
        let (server, _) = listener.accept().unwrap();
        Arc::new(ClientHandle::new(server))
    }

    #[test]
    fn test_register_evicts_previous() {
        let shared = SharedState::new();
        let first = test_handle();
        let second = test_handle();

        assert!(shared.register("cam1", Arc::clone(&first)).is_none());
        let evicted = shared.register("cam1", Arc::clone(&second)).unwrap();
        assert!(Arc::ptr_eq(&evicted, &first));
        assert_eq!(shared.client_count(), 1);
    }

    #[test]
    fn test_evicted_connection_cannot_deregister_successor() {
        let shared = SharedState::new();
        let first = test_handle();
        let second = test_handle();

        shared.register("cam1", Arc::clone(&first));
        shared.register("cam1", Arc::clone(&second));

        // The evicted connection's teardown must be a no-op.
        assert!(!shared.unregister_if_owner("cam1", &first));
        assert_eq!(shared.client_count(), 1);

        assert!(shared.unregister_if_owner("cam1", &second));
        assert_eq!(shared.client_count(), 0);
    }

    #[test]
    fn test_topic_table_pruning() {
        let shared = SharedState::new();
        let h1 = test_handle();
        let h2 = test_handle();
        shared.register("a", Arc::clone(&h1));
        shared.register("b", Arc::clone(&h2));

        shared.subscribe("a", "siot/img");
        shared.subscribe("b", "siot/img");
        shared.subscribe("a", "siot/ctl");

        assert_eq!(shared.subscribers_of("siot/img").len(), 2);

        shared.unsubscribe("b", "siot/img");
        assert_eq!(shared.subscribers_of("siot/img").len(), 1);

        shared.remove_all_subscriptions("a");
        assert!(shared.subscribers_of("siot/img").is_empty());
        assert!(shared.subscribers_of("siot/ctl").is_empty());
    }

    #[test]
    fn test_subscribers_of_skips_unregistered_ids() {
        let shared = SharedState::new();
        // Subscription left behind by a client that is no longer registered.
        shared.subscribe("ghost", "t");
        assert!(shared.subscribers_of("t").is_empty());
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let shared = SharedState::new();
        let a = shared.generate_client_id();
        let b = shared.generate_client_id();
        assert_ne!(a, b);
        assert!(a.starts_with("client-"));
    }
}
