//! Bootstrap client: the joiner side of the introduction handshake.

use fernet::Fernet;
use p2pname_types::Contact;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::info;

use crate::{IntroError, Result};

/// Length in bytes of a Fernet key's base64 representation.
const SESSION_KEY_LEN: usize = 44;

#[derive(Serialize)]
struct JoinRequest<'a> {
    listening_ip: &'a str,
    listening_port: u16,
}

#[derive(Deserialize)]
struct PeerInfo {
    public_ip: String,
    port: u16,
}

#[derive(Deserialize)]
struct JoinReply {
    virtual_ip: String,
    nearby_peers: Vec<PeerInfo>,
    encryption_key: String,
}

/// The decoded result of a successful join.
pub struct JoinResult {
    /// The virtual address assigned by the introduction server.
    pub virtual_ip: String,
    /// Contacts constructed from the server's seed list.
    pub seeds: Vec<Contact>,
    /// The session key shipped in the reply, stashed for nominal future
    /// inter-peer use (see the spec's note on its weak-seed status).
    pub encryption_key: String,
}

/// Perform the join handshake against an introduction server at
/// `(intro_host, intro_port)`, advertising this peer's own listening
/// `(ip, port)`.
pub async fn join(
    intro_host: &str,
    intro_port: u16,
    listening_ip: &str,
    listening_port: u16,
) -> Result<JoinResult> {
    let mut stream = TcpStream::connect((intro_host, intro_port))
        .await
        .map_err(|e| IntroError::Io(e.to_string()))?;

    let request = JoinRequest {
        listening_ip,
        listening_port,
    };
    let body = serde_json::to_vec(&request).map_err(|e| IntroError::Malformed(e.to_string()))?;
    stream
        .write_all(&body)
        .await
        .map_err(|e| IntroError::Io(e.to_string()))?;

    // `read_exact` itself enforces the "received exactly 44 bytes" contract:
    // a short read before EOF (the stream closing early) surfaces as an
    // `UnexpectedEof` here, which is exactly the source's `KeyLengthError`.
    let mut key_buf = [0u8; SESSION_KEY_LEN];
    stream
        .read_exact(&mut key_buf)
        .await
        .map_err(|e| IntroError::KeyLength(e.to_string()))?;
    let key_str =
        std::str::from_utf8(&key_buf).map_err(|e| IntroError::KeyLength(e.to_string()))?;
    let cipher =
        Fernet::new(key_str).ok_or_else(|| IntroError::KeyLength("invalid key".to_string()))?;

    let mut ciphertext = Vec::new();
    stream
        .read_to_end(&mut ciphertext)
        .await
        .map_err(|e| IntroError::Io(e.to_string()))?;
    let ciphertext =
        std::str::from_utf8(&ciphertext).map_err(|e| IntroError::Decrypt(e.to_string()))?;

    let plaintext = cipher
        .decrypt(ciphertext)
        .map_err(|e| IntroError::Decrypt(e.to_string()))?;
    let reply: JoinReply =
        serde_json::from_slice(&plaintext).map_err(|e| IntroError::Malformed(e.to_string()))?;

    let seeds = reply
        .nearby_peers
        .into_iter()
        .map(|peer| Contact::from_address(peer.public_ip, peer.port))
        .collect();

    info!(virtual_ip = %reply.virtual_ip, "joined network");

    Ok(JoinResult {
        virtual_ip: reply.virtual_ip,
        seeds,
        encryption_key: reply.encryption_key,
    })
}
