//! The DHT node: local key/value store, routing table, and connection
//! server.
//!
//! State (routing table, local store) lives behind a single `tokio::sync`
//! mutex so a node can be cloned and shared between its own accept loop and
//! application-level calls (`store`/`find_node`/`find_value`) without data
//! races. The lock is held only across the brief synchronous state touches
//! — never across an awaited remote RPC — so a long-running lookup never
//! blocks this node from answering incoming requests, matching the
//! single-threaded-per-node cooperative model of §5.

use std::collections::HashMap;
use std::sync::Arc;

use p2pname_kademlia::table::RoutingTable;
use p2pname_kademlia::K;
use p2pname_rpc::codec::{self, Request};
use p2pname_rpc::tcp;
use p2pname_types::{Contact, Id};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::lookup::IterativeLookup;
use crate::store;
use crate::{NodeError, Result};

struct NodeState {
    routing_table: RoutingTable,
    local_store: HashMap<Id, String>,
}

/// The `K` contacts closest to `key` among both `table`'s known contacts
/// and `self_contact`, sorted by ascending XOR distance with ties broken by
/// lower id — the same ranking `RoutingTable::find_closest` and
/// `IterativeLookup::merge` use, extended to let the local node compete for
/// a spot instead of being structurally excluded.
fn closest_with_self(table: &RoutingTable, self_contact: &Contact, key: &Id) -> Vec<Contact> {
    let mut candidates = table.find_closest(key);
    candidates.push(self_contact.clone());
    candidates.sort_by(|a, b| {
        key.distance(&a.id)
            .cmp(&key.distance(&b.id))
            .then_with(|| a.id.cmp(&b.id))
    });
    candidates.dedup_by(|a, b| a.id == b.id);
    candidates.truncate(K);
    candidates
}

/// A DHT node: a cheaply-cloned handle around shared routing-table and
/// local-store state plus this node's own (immutable) contact record.
#[derive(Clone)]
pub struct DhtNode {
    contact: Contact,
    state: Arc<Mutex<NodeState>>,
}

impl DhtNode {
    /// Construct a node listening (nominally) at `ip:port`, with an id
    /// derived the same way contacts are: `hash_id("ip:port")`.
    pub fn new(ip: impl Into<String>, port: u16) -> Self {
        let contact = Contact::from_address(ip, port);
        let state = NodeState {
            routing_table: RoutingTable::new(contact.id),
            local_store: HashMap::new(),
        };
        Self {
            contact,
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// This node's own contact record.
    pub fn contact(&self) -> Contact {
        self.contact.clone()
    }

    /// This node's id.
    pub fn id(&self) -> Id {
        self.contact.id
    }

    /// Number of contacts currently held in the routing table.
    pub async fn routing_table_len(&self) -> usize {
        self.state.lock().await.routing_table.len()
    }

    /// Attempt a `PING` against every seed; successful pongs populate the
    /// routing table.
    pub async fn bootstrap(&self, seeds: Vec<Contact>) {
        info!(seed_count = seeds.len(), "bootstrapping");
        for seed in seeds {
            self.ping(&seed).await;
        }
    }

    /// Ping `contact`. On a genuine `PONG`, add it to the routing table and
    /// return `true`. Any I/O or protocol failure returns `false` and
    /// leaves the routing table untouched.
    pub async fn ping(&self, contact: &Contact) -> bool {
        match tcp::ping(&contact.ip, contact.port).await {
            Ok(true) => {
                self.state.lock().await.routing_table.add(contact.clone());
                debug!(peer = %contact.id, "ping succeeded");
                true
            }
            Ok(false) => {
                warn!(peer = %contact.id, "ping replied but not with PONG");
                false
            }
            Err(e) => {
                warn!(peer = %contact.id, error = %e, "ping failed");
                false
            }
        }
    }

    /// Store `value` under `key` on the `K` contacts closest to `key`
    /// (writing locally when this node is one of them).
    ///
    /// `RoutingTable::find_closest` structurally never returns the local
    /// contact (a node's own id is never inserted into its own table), so
    /// the local contact is merged into the ranking by hand before the
    /// closest-`K` cut is taken. This is what lets a node with an empty
    /// routing table — the only node it knows about being itself — still
    /// win the ranking and write locally.
    pub async fn store(&self, key: Id, value: String) {
        let closest = {
            let state = self.state.lock().await;
            closest_with_self(&state.routing_table, &self.contact, &key)
        };

        let mut remote = Vec::new();
        for contact in closest {
            if contact.id == self.contact.id {
                self.state.lock().await.local_store.insert(key, value.clone());
            } else {
                remote.push(contact);
            }
        }
        store::store_remote(&remote, key, &value).await;
    }

    /// Iterative lookup converging on the `K` contacts closest to `target`.
    pub async fn find_node(&self, target: Id) -> Vec<Contact> {
        let seed = self.state.lock().await.routing_table.find_closest(&target);
        if seed.is_empty() {
            return Vec::new();
        }
        IterativeLookup::new(target, seed).run_find_node().await
    }

    /// Iterative lookup for `key`. Returns immediately from the local store
    /// with zero network calls if held locally.
    pub async fn find_value(&self, key: Id) -> (Option<String>, Vec<Contact>) {
        let local_hit = self.state.lock().await.local_store.get(&key).cloned();
        if let Some(value) = local_hit {
            return (Some(value), Vec::new());
        }

        let seed = self.state.lock().await.routing_table.find_closest(&key);
        if seed.is_empty() {
            return (None, Vec::new());
        }
        IterativeLookup::new(key, seed).run_find_value().await
    }

    /// Handle one already-decoded request against locked state, returning
    /// the reply bytes. Purely synchronous: never suspends while holding
    /// the lock.
    fn handle_request(state: &mut NodeState, request: Request) -> Vec<u8> {
        match request {
            Request::Ping => b"PONG".to_vec(),
            Request::Store { key, value } => {
                state.local_store.insert(key, value);
                b"OK".to_vec()
            }
            Request::FindNode { target } => {
                let closest = state.routing_table.find_closest(&target);
                codec::encode_nodes_reply(&closest)
            }
            Request::FindValue { key } => match state.local_store.get(&key) {
                Some(value) => codec::encode_value_reply(value),
                None => {
                    let closest = state.routing_table.find_closest(&key);
                    codec::encode_nodes_reply(&closest)
                }
            },
        }
    }

    /// Bind a listener at this node's advertised address and serve
    /// connections until the process ends or the listener errors out.
    ///
    /// Each accepted connection is read, dispatched, replied to, and closed
    /// before the next is accepted; the shared lock is taken only for the
    /// synchronous dispatch step.
    pub async fn serve(&self) -> Result<()> {
        let listener = tcp::bind(&self.contact.ip, self.contact.port)
            .await
            .map_err(|e| NodeError::Transport(e.to_string()))?;
        info!(ip = %self.contact.ip, port = self.contact.port, "listening");

        loop {
            let (mut stream, peer_addr) = match listener.accept().await {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    continue;
                }
            };

            let request = match tcp::read_request(&mut stream).await {
                Ok(r) => r,
                Err(e) => {
                    debug!(%peer_addr, error = %e, "failed to read request");
                    continue;
                }
            };
            let reply = {
                let mut state = self.state.lock().await;
                Self::handle_request(&mut state, request)
            };
            if let Err(e) = tcp::reply(&mut stream, &reply).await {
                debug!(%peer_addr, error = %e, "failed to write reply");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn handle_ping_replies_pong() {
        let node = DhtNode::new("127.0.0.1", 9000);
        let mut state = node.state.lock().await;
        assert_eq!(DhtNode::handle_request(&mut state, Request::Ping), b"PONG".to_vec());
    }

    #[tokio::test]
    async fn handle_store_then_find_value_hits_locally() {
        let node = DhtNode::new("127.0.0.1", 9000);
        let key = Id::hash("example.com");
        {
            let mut state = node.state.lock().await;
            let reply = DhtNode::handle_request(
                &mut state,
                Request::Store {
                    key,
                    value: "10.0.0.1 extra".to_string(),
                },
            );
            assert_eq!(reply, b"OK".to_vec());
        }
        let (value, contacts) = node.find_value(key).await;
        assert_eq!(value, Some("10.0.0.1 extra".to_string()));
        assert!(contacts.is_empty());
    }

    #[tokio::test]
    async fn store_on_a_node_with_an_empty_routing_table_writes_locally() {
        // A solo node — spec.md §8 S1 — has no routing table entries at
        // all, so it is the only candidate `store` can rank; it must still
        // win against an empty shortlist rather than the value landing
        // nowhere.
        let node = DhtNode::new("127.0.0.1", 9000);
        assert_eq!(node.routing_table_len().await, 0);

        let key = Id::hash("example.com");
        node.store(key, "10.0.0.1".to_string()).await;

        let (value, _) = node.find_value(key).await;
        assert_eq!(value, Some("10.0.0.1".to_string()));
    }

    #[tokio::test]
    async fn handle_find_node_returns_nodes_json() {
        let node = DhtNode::new("127.0.0.1", 9000);
        let mut state = node.state.lock().await;
        let reply = DhtNode::handle_request(
            &mut state,
            Request::FindNode {
                target: Id::hash("x"),
            },
        );
        let text = String::from_utf8(reply).unwrap();
        assert!(text.contains("\"nodes\""));
    }

    #[tokio::test]
    async fn find_value_with_empty_table_and_no_local_hit_returns_none() {
        let node = DhtNode::new("127.0.0.1", 9000);
        let (value, contacts) = node.find_value(Id::hash("absent")).await;
        assert_eq!(value, None);
        assert!(contacts.is_empty());
    }
}
