//! Application-facing façade: register/lookup names over the DHT.

use p2pname_types::Id;
use tracing::info;

use crate::node::DhtNode;

/// A thin wrapper over [`DhtNode`] exposing the name-resolution API that
/// applications actually call.
#[derive(Clone)]
pub struct Peer {
    node: DhtNode,
}

impl Peer {
    /// Wrap an already-constructed node.
    pub fn new(node: DhtNode) -> Self {
        Self { node }
    }

    /// The underlying DHT node.
    pub fn node(&self) -> &DhtNode {
        &self.node
    }

    /// Register `name -> value`, then read it back as a liveness check.
    ///
    /// Returns whether the read-back value matches what was written; this
    /// is a liveness-style check, not a correctness guarantee (a concurrent
    /// writer could have overwritten the value between the two calls).
    pub async fn register_domain(&self, name: &str, value: &str) -> bool {
        let key = Id::hash(name);
        info!(%name, %value, "registering domain");
        self.node.store(key, value.to_string()).await;
        let (stored, _) = self.node.find_value(key).await;
        let ok = stored.as_deref() == Some(value);
        info!(%name, ok, "registration check complete");
        ok
    }

    /// Resolve `name`, if any value has been registered for it.
    pub async fn lookup_domain(&self, name: &str) -> Option<String> {
        let key = Id::hash(name);
        let (value, _) = self.node.find_value(key).await;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn register_then_lookup_round_trips_on_a_solo_node() {
        let node = DhtNode::new("127.0.0.1", 9100);
        let peer = Peer::new(node);

        assert!(peer.register_domain("example.com", "10.0.0.1").await);
        assert_eq!(
            peer.lookup_domain("example.com").await,
            Some("10.0.0.1".to_string())
        );
        assert_eq!(peer.lookup_domain("nonexistent.com").await, None);
    }
}
