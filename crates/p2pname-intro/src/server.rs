//! The introduction server: virtual address allocation, seed selection, and
//! the one-shot encrypted join handshake.

use std::collections::HashMap;

use fernet::Fernet;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

use crate::pool::VirtualAddressPool;
use crate::{IntroError, Result};

/// Maximum number of seeds offered to a new joiner.
const MAX_SEEDS: usize = 5;

/// Maximum size of the inbound join request.
const MAX_REQUEST: usize = 1024;

#[derive(Deserialize)]
struct JoinRequest {
    listening_ip: String,
    listening_port: u16,
}

#[derive(Serialize)]
struct PeerInfo {
    public_ip: String,
    port: u16,
}

#[derive(Serialize)]
struct JoinReply {
    virtual_ip: String,
    nearby_peers: Vec<PeerInfo>,
    encryption_key: String,
}

struct ServerState {
    pool: VirtualAddressPool,
    registry: HashMap<String, (String, u16)>,
}

/// Listens for joiners, hands each a virtual address, a seed of existing
/// peers, and an encrypted copy of the reply payload.
///
/// All state — the address pool and peer registry — is owned by this
/// server's own scheduler and mutated only from the one task driving
/// `serve`; connections are handled one at a time, matching §5's
/// single-threaded cooperative model.
pub struct IntroServer {
    session_key: Fernet,
    session_key_str: String,
    state: ServerState,
}

impl IntroServer {
    /// A fresh server with an empty registry and a full `10.0.0.0/8`
    /// address pool, generating a new session key for this process
    /// lifetime.
    pub fn new() -> Self {
        let session_key_str = Fernet::generate_key();
        let session_key =
            Fernet::new(&session_key_str).expect("freshly generated Fernet key is valid");
        Self {
            session_key,
            session_key_str,
            state: ServerState {
                pool: VirtualAddressPool::new(),
                registry: HashMap::new(),
            },
        }
    }

    /// Number of peers registered so far.
    pub fn registry_len(&self) -> usize {
        self.state.registry.len()
    }

    /// Bind a listener at `(host, port)` and serve join requests until the
    /// process ends or the listener errors out.
    pub async fn serve(mut self, host: &str, port: u16) -> Result<()> {
        let listener = TcpListener::bind((host, port))
            .await
            .map_err(|e| IntroError::Io(e.to_string()))?;
        info!(%host, port, "introduction server listening");

        loop {
            let (mut stream, peer_addr) = match listener.accept().await {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    continue;
                }
            };

            if let Err(e) = self.handle_join(&mut stream).await {
                warn!(%peer_addr, error = %e, "join request failed");
            }
        }
    }

    /// Handle one inbound join request end to end: steps 1–7 of the
    /// handshake. Registration happens after the reply is sent, preserving
    /// the source's observable ordering.
    async fn handle_join(&mut self, stream: &mut TcpStream) -> Result<()> {
        let mut buf = vec![0u8; MAX_REQUEST];
        let n = stream
            .read(&mut buf)
            .await
            .map_err(|e| IntroError::Io(e.to_string()))?;
        buf.truncate(n);
        let request: JoinRequest =
            serde_json::from_slice(&buf).map_err(|e| IntroError::Malformed(e.to_string()))?;

        let virtual_ip = self
            .state
            .pool
            .allocate()
            .ok_or(IntroError::NoAddressAvailable)?;
        let nearby_peers = self.select_seeds();

        let reply = JoinReply {
            virtual_ip: virtual_ip.clone(),
            nearby_peers,
            encryption_key: self.session_key_str.clone(),
        };
        let plaintext = serde_json::to_vec(&reply).map_err(|e| IntroError::Malformed(e.to_string()))?;
        let ciphertext = self.session_key.encrypt(&plaintext);

        stream
            .write_all(self.session_key_str.as_bytes())
            .await
            .map_err(|e| IntroError::Io(e.to_string()))?;
        stream
            .write_all(ciphertext.as_bytes())
            .await
            .map_err(|e| IntroError::Io(e.to_string()))?;
        stream.shutdown().await.map_err(|e| IntroError::Io(e.to_string()))?;

        self.state
            .registry
            .insert(virtual_ip.clone(), (request.listening_ip, request.listening_port));
        info!(%virtual_ip, "peer joined");

        Ok(())
    }

    /// Up to [`MAX_SEEDS`] peers sampled uniformly without replacement from
    /// the registry as it stood before this join.
    fn select_seeds(&self) -> Vec<PeerInfo> {
        let entries: Vec<_> = self.state.registry.values().collect();
        let count = MAX_SEEDS.min(entries.len());
        entries
            .choose_multiple(&mut rand::thread_rng(), count)
            .map(|(ip, port)| PeerInfo {
                public_ip: ip.clone(),
                port: *port,
            })
            .collect()
    }
}

impl Default for IntroServer {
    fn default() -> Self {
        Self::new()
    }
}
