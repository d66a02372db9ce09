//! Byte-level encode/decode for the DHT RPC wire protocol.
//!
//! Every RPC is ASCII text with a fixed 4-byte opcode tag first, so a
//! receiver can branch after reading exactly 4 bytes. `FIND` requests carry
//! a second discriminator (`_NODE` vs `_VALUE`) read as 5 more bytes. See
//! [`tcp`](crate::tcp) for the async read/write side of this framing.

use p2pname_types::{Contact, Id};
use serde::{Deserialize, Serialize};

use crate::{RpcError, Result};

/// Maximum size of a request or reply frame.
pub const MAX_FRAME: usize = 1024;

/// A decoded DHT RPC request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
    Ping,
    Store { key: Id, value: String },
    FindNode { target: Id },
    FindValue { key: Id },
}

impl Request {
    /// Encode this request as the exact bytes sent on the wire.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Request::Ping => b"PING".to_vec(),
            Request::Store { key, value } => {
                format!("STOR{} {}", key.to_decimal(), value).into_bytes()
            }
            Request::FindNode { target } => {
                format!("FIND_NODE {}", target.to_decimal()).into_bytes()
            }
            Request::FindValue { key } => format!("FIND_VALUE {}", key.to_decimal()).into_bytes(),
        }
    }

    /// Decode a `STOR` request body (the bytes after the `STOR` tag): a
    /// decimal key, one space, then the value verbatim (which may itself
    /// contain spaces).
    pub fn decode_store_body(body: &[u8]) -> Result<Request> {
        let text = std::str::from_utf8(body).map_err(|e| RpcError::Decode(e.to_string()))?;
        let (key_str, value) = text
            .split_once(' ')
            .ok_or_else(|| RpcError::Decode("STOR body missing key/value separator".into()))?;
        let key = Id::from_decimal(key_str)
            .ok_or_else(|| RpcError::Decode(format!("invalid decimal key: {key_str}")))?;
        Ok(Request::Store {
            key,
            value: value.to_string(),
        })
    }

    /// Decode a `FIND_NODE <decimal>` body, `after_find` being everything
    /// after the literal `FIND` tag (i.e. starting with `_NODE `).
    pub fn decode_find_node_body(after_find: &str) -> Result<Request> {
        let arg = after_find
            .strip_prefix("_NODE ")
            .ok_or_else(|| RpcError::Decode("malformed FIND_NODE request".into()))?;
        let target = Id::from_decimal(arg.trim())
            .ok_or_else(|| RpcError::Decode(format!("invalid decimal target: {arg}")))?;
        Ok(Request::FindNode { target })
    }

    /// Decode a `FIND_VALUE <decimal>` body, `after_find` being everything
    /// after the literal `FIND` tag (i.e. starting with `_VALUE `).
    pub fn decode_find_value_body(after_find: &str) -> Result<Request> {
        let arg = after_find
            .strip_prefix("_VALUE ")
            .ok_or_else(|| RpcError::Decode("malformed FIND_VALUE request".into()))?;
        let key = Id::from_decimal(arg.trim())
            .ok_or_else(|| RpcError::Decode(format!("invalid decimal key: {arg}")))?;
        Ok(Request::FindValue { key })
    }
}

/// JSON shape of a `{id, ip, port}` entry inside a `nodes` reply.
#[derive(Serialize, Deserialize)]
struct WireContact {
    id: String,
    ip: String,
    port: u16,
}

impl From<&Contact> for WireContact {
    fn from(c: &Contact) -> Self {
        WireContact {
            id: c.id.to_decimal(),
            ip: c.ip.clone(),
            port: c.port,
        }
    }
}

impl WireContact {
    fn into_contact(self) -> Result<Contact> {
        let id = Id::from_decimal(&self.id)
            .ok_or_else(|| RpcError::Decode(format!("invalid decimal id: {}", self.id)))?;
        Ok(Contact::new(id, self.ip, self.port))
    }
}

#[derive(Serialize, Deserialize)]
struct NodesReplyJson {
    nodes: Vec<WireContact>,
}

#[derive(Serialize, Deserialize)]
struct ValueReplyJson {
    value: String,
}

/// The polymorphic result of a `FIND_VALUE` RPC: either the value itself or
/// the closest contacts known to the remote peer (spec's tagged union).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LookupReply {
    Value(String),
    Nodes(Vec<Contact>),
}

/// Encode a `{"nodes": [...]}` reply (used for both `FIND_NODE` replies and
/// `FIND_VALUE` misses).
pub fn encode_nodes_reply(contacts: &[Contact]) -> Vec<u8> {
    let json = NodesReplyJson {
        nodes: contacts.iter().map(WireContact::from).collect(),
    };
    serde_json::to_vec(&json).unwrap_or_default()
}

/// Encode a `{"value": "..."}` reply (a `FIND_VALUE` hit).
pub fn encode_value_reply(value: &str) -> Vec<u8> {
    let json = ValueReplyJson {
        value: value.to_string(),
    };
    serde_json::to_vec(&json).unwrap_or_default()
}

/// Decode a `FIND_NODE` reply body into a contact list.
pub fn decode_nodes_reply(body: &[u8]) -> Result<Vec<Contact>> {
    let json: NodesReplyJson =
        serde_json::from_slice(body).map_err(|e| RpcError::Decode(e.to_string()))?;
    json.nodes
        .into_iter()
        .map(WireContact::into_contact)
        .collect()
}

/// Decode a `FIND_VALUE` reply body, which is either a value hit or a
/// nodes-list miss.
pub fn decode_lookup_reply(body: &[u8]) -> Result<LookupReply> {
    if let Ok(json) = serde_json::from_slice::<ValueReplyJson>(body) {
        return Ok(LookupReply::Value(json.value));
    }
    let nodes = decode_nodes_reply(body)?;
    Ok(LookupReply::Nodes(nodes))
}
