//! # p2pname-rpc
//!
//! Wire protocol and transport for the DHT RPC layer: PING / STOR /
//! FIND_NODE / FIND_VALUE framed as fixed-tag ASCII text over plain TCP.
//!
//! ## Architecture
//!
//! ```text
//! Request / Reply (codec.rs)  -- ASCII opcode framing, JSON reply bodies
//!     |
//!     v
//! TcpStream (tcp.rs)          -- one connection per RPC, server closes after reply
//! ```

pub mod codec;
pub mod tcp;

/// Error types for RPC encode/decode and transport operations.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// Connect/read/write failure.
    #[error("I/O error: {0}")]
    Io(String),

    /// Malformed JSON or unparseable text frame.
    #[error("decode error: {0}")]
    Decode(String),

    /// Unexpected reply content or opcode.
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Result type alias for RPC operations.
pub type Result<T> = std::result::Result<T, RpcError>;
