//! # p2pname-intro
//!
//! The introduction/bootstrap handshake: a joiner contacts a well-known
//! introduction server, receives a virtual address and a handful of seed
//! peers, and the whole reply is wrapped in a single Fernet-encrypted frame.
//!
//! ## Architecture
//!
//! ```text
//! client.rs  -- join()            IntroServer (server.rs)
//!     |                                |
//!     +------------- TCP -------------+
//!                                      |
//!                               pool.rs  -- virtual address allocation
//! ```

pub mod client;
pub mod pool;
pub mod server;

/// Error types for the introduction handshake.
#[derive(Debug, thiserror::Error)]
pub enum IntroError {
    /// The virtual address pool has been exhausted.
    #[error("no virtual address available")]
    NoAddressAvailable,

    /// The session key did not have the expected shape.
    #[error("bad session key: {0}")]
    KeyLength(String),

    /// Fernet decryption of the reply failed.
    #[error("decryption failed: {0}")]
    Decrypt(String),

    /// The request or reply body did not parse.
    #[error("malformed message: {0}")]
    Malformed(String),

    /// An I/O error occurred on the handshake connection.
    #[error("I/O error: {0}")]
    Io(String),
}

/// Result type alias for introduction-handshake operations.
pub type Result<T> = std::result::Result<T, IntroError>;
