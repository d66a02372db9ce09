//! Shared types used across the p2pname workspace: 160-bit identifiers and
//! the `Contact` record exchanged over the wire.

pub mod contact;
pub mod id;

pub use contact::Contact;
pub use id::{Id, ID_BITS};
