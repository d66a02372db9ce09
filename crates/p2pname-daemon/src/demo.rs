//! In-process demo: spins up an introduction server and a ring of DHT nodes,
//! joins them all, then exercises domain registration and lookup.
//!
//! Mirrors the reference driver's `main()`: start the nodes, run their
//! accept loops as background tasks, join each one to the introduction
//! server, let the network settle, then register a couple of domains from
//! one node and resolve them from another.

use std::time::Duration;

use p2pname_intro::server::IntroServer;
use p2pname_node::node::DhtNode;
use p2pname_node::peer::Peer;
use tracing::info;

const INTRO_HOST: &str = "127.0.0.1";
const INTRO_PORT: u16 = 8888;
const NODE_BASE_PORT: u16 = 9000;

/// Run the demo network with `node_count` nodes, returning once the
/// register/lookup exercise has completed.
pub async fn run(node_count: usize) -> anyhow::Result<()> {
    let intro_server = IntroServer::new();
    tokio::spawn(intro_server.serve(INTRO_HOST, INTRO_PORT));
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut peers = Vec::with_capacity(node_count);
    for i in 0..node_count {
        let port = NODE_BASE_PORT + i as u16;
        let node = DhtNode::new("127.0.0.1", port);
        tokio::spawn({
            let node = node.clone();
            async move {
                if let Err(e) = node.serve().await {
                    tracing::error!(port, error = %e, "node accept loop exited");
                }
            }
        });
        peers.push(Peer::new(node));
    }

    info!(count = node_count, "all nodes listening, joining network");
    for (i, peer) in peers.iter().enumerate() {
        let port = NODE_BASE_PORT + i as u16;
        match p2pname_intro::client::join(INTRO_HOST, INTRO_PORT, "127.0.0.1", port).await {
            Ok(join_result) => {
                let virtual_ip = join_result.virtual_ip.clone();
                if !join_result.seeds.is_empty() {
                    peer.node().bootstrap(join_result.seeds).await;
                } else {
                    info!(port, "no bootstrap nodes available");
                }
                info!(port, virtual_ip = %virtual_ip, "joined network");
            }
            Err(e) => tracing::error!(port, error = %e, "failed to join network"),
        }
    }
    info!("all nodes have joined the network");

    tokio::time::sleep(Duration::from_secs(1)).await;

    info!("registering domains");
    if let Some(peer) = peers.first() {
        let ok = peer.register_domain("example.com", "10.0.0.1").await;
        info!(ok, "registration of example.com");
    }
    if let Some(peer) = peers.get(1) {
        let ok = peer.register_domain("test.com", "10.0.0.2").await;
        info!(ok, "registration of test.com");
    }

    tokio::time::sleep(Duration::from_millis(500)).await;

    info!("looking up domains");
    if let Some(observer) = peers.get(node_count / 2) {
        for domain in ["example.com", "test.com", "nonexistent.com"] {
            let result = observer.lookup_domain(domain).await;
            info!(domain, ?result, "lookup result");
        }
    } else {
        info!("no nodes running, skipping lookups");
    }

    Ok(())
}
