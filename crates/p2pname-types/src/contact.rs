//! A peer entry in the overlay: `(id, ip, port)`.

use std::fmt;

use crate::id::Id;

/// A contact known to a DHT node: its id plus a dotted-quad IP and port.
///
/// Equality and hashing are by `id` alone, matching the source protocol's
/// `Node.__eq__`/`__hash__` override — two contacts with the same id are the
/// same contact even if their recorded address differs.
///
/// Not itself `Serialize`/`Deserialize` — the wire format's `{id, ip, port}`
/// JSON shape goes through `p2pname_rpc::codec::WireContact`, which encodes
/// the id as its decimal string rather than relying on serde for `Id`.
#[derive(Clone, Debug)]
pub struct Contact {
    pub id: Id,
    pub ip: String,
    pub port: u16,
}

impl Contact {
    /// Construct a contact, deriving its id from `"{ip}:{port}"` — the
    /// derivation used throughout the overlay for peers learned via the
    /// introduction server or the DHT wire protocol.
    pub fn from_address(ip: impl Into<String>, port: u16) -> Self {
        let ip = ip.into();
        let id = Id::hash(&format!("{ip}:{port}"));
        Self { id, ip, port }
    }

    /// Construct a contact with an explicit id (used when the id is already
    /// known, e.g. decoded from a `FIND_NODE`/`FIND_VALUE` reply).
    pub fn new(id: Id, ip: impl Into<String>, port: u16) -> Self {
        Self {
            id,
            ip: ip.into(),
            port,
        }
    }
}

impl PartialEq for Contact {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Contact {}

impl std::hash::Hash for Contact {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Contact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.id, self.ip, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_by_id_only() {
        let a = Contact::new(Id::hash("x"), "1.2.3.4", 9000);
        let b = Contact::new(Id::hash("x"), "5.6.7.8", 9001);
        assert_eq!(a, b);
    }

    #[test]
    fn from_address_derives_id_from_ip_port() {
        let c = Contact::from_address("127.0.0.1", 9000);
        assert_eq!(c.id, Id::hash("127.0.0.1:9000"));
    }
}
