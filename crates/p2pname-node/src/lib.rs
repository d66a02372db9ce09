//! # p2pname-node
//!
//! The DHT node itself: local key/value store, connection server, the
//! shared iterative lookup driver, concurrent `STOR` fan-out, and the
//! `register_domain`/`lookup_domain` application façade.
//!
//! ## Architecture
//!
//! ```text
//! Peer (peer.rs)           -- register_domain / lookup_domain
//!     |
//!     v
//! DhtNode (node.rs)        -- routing table + local store + accept loop
//!     |
//!     +-- lookup.rs        -- iterative find_node / find_value driver
//!     +-- store.rs         -- concurrent STOR fan-out
//!     |
//!     v
//! p2pname-rpc              -- wire codec + TCP transport
//! ```

pub mod lookup;
pub mod node;
pub mod peer;
pub mod store;

/// Error types surfaced at the façade/CLI edge.
///
/// Internal RPC failures during `store`/`find_node`/`find_value` are
/// swallowed per the propagation rule (they manifest as reduced coverage,
/// not errors) and never reach this type.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// Failed to bind or otherwise operate the node's TCP listener.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Result type alias for node-level operations.
pub type Result<T> = std::result::Result<T, NodeError>;
