//! End-to-end scenarios over real TCP loopback connections, matching the
//! concrete scenarios enumerated in the name-resolution overlay's scenario
//! list (S1, S2, S3, S6): a solo node, a ten-node ring, the introduction
//! server's seed-sampling bound, and routing-table updates happening only
//! on a successful ping.
//!
//! Each scenario spins up real `DhtNode`/`IntroServer` instances bound to
//! distinct loopback ports and drives them exactly as an application would:
//! through `Peer::register_domain`/`lookup_domain` and
//! `p2pname_intro::client::join`.

use std::time::Duration;

use p2pname_intro::server::IntroServer;
use p2pname_node::node::DhtNode;
use p2pname_node::peer::Peer;

async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}

/// S1 — solo register/lookup: a single node joins an otherwise-empty
/// network, registers a domain, and resolves it from itself.
#[tokio::test]
#[ignore]
async fn s1_solo_register_and_lookup() {
    let intro_port = 29001;
    let node_port = 19001;

    let server = IntroServer::new();
    tokio::spawn(server.serve("127.0.0.1", intro_port));
    settle().await;

    let node = DhtNode::new("127.0.0.1", node_port);
    tokio::spawn({
        let node = node.clone();
        async move { node.serve().await }
    });
    settle().await;

    let join_result = p2pname_intro::client::join("127.0.0.1", intro_port, "127.0.0.1", node_port)
        .await
        .expect("join should succeed");
    assert!(join_result.seeds.is_empty(), "first joiner has no seeds");

    let peer = Peer::new(node.clone());
    assert_eq!(node.routing_table_len().await, 0);

    assert!(
        peer.register_domain("example.com", "10.0.0.1").await,
        "registration liveness check should pass"
    );
    assert_eq!(
        peer.lookup_domain("example.com").await,
        Some("10.0.0.1".to_string())
    );
    assert_eq!(peer.lookup_domain("nonexistent.com").await, None);
}

/// S2 — ten-node ring: ten nodes all join the same introduction server,
/// ping each other into their routing tables via bootstrap, and a name
/// registered from one node resolves from a distant one.
#[tokio::test]
#[ignore]
async fn s2_ten_node_ring_propagates_registrations() {
    let intro_port = 29002;
    let base_port = 19100;
    let node_count = 10u16;

    let server = IntroServer::new();
    tokio::spawn(server.serve("127.0.0.1", intro_port));
    settle().await;

    let mut peers = Vec::with_capacity(node_count as usize);
    for i in 0..node_count {
        let node = DhtNode::new("127.0.0.1", base_port + i);
        tokio::spawn({
            let node = node.clone();
            async move { node.serve().await }
        });
        peers.push(Peer::new(node));
    }
    settle().await;

    for (i, peer) in peers.iter().enumerate() {
        let port = base_port + i as u16;
        let join_result = p2pname_intro::client::join("127.0.0.1", intro_port, "127.0.0.1", port)
            .await
            .expect("join should succeed");
        peer.node().bootstrap(join_result.seeds).await;
    }
    settle().await;

    assert!(
        peers[0].register_domain("example.com", "10.0.0.1").await,
        "node 0 registration should succeed"
    );
    assert!(
        peers[1].register_domain("test.com", "10.0.0.2").await,
        "node 1 registration should succeed"
    );
    settle().await;

    let observer = &peers[5];
    assert_eq!(
        observer.lookup_domain("example.com").await,
        Some("10.0.0.1".to_string())
    );
    assert_eq!(
        observer.lookup_domain("test.com").await,
        Some("10.0.0.2".to_string())
    );
    assert_eq!(observer.lookup_domain("nonexistent.com").await, None);
}

/// S3 — with 20 peers already registered, a new joiner's seed list never
/// exceeds the 5-peer sampling bound.
#[tokio::test]
#[ignore]
async fn s3_seed_sampling_is_bounded_at_twenty_peers() {
    let intro_port = 29003;
    let base_port = 19200;

    let server = IntroServer::new();
    tokio::spawn(server.serve("127.0.0.1", intro_port));
    settle().await;

    for i in 0..20u16 {
        p2pname_intro::client::join("127.0.0.1", intro_port, "127.0.0.1", base_port + i)
            .await
            .expect("join should succeed");
    }

    let joiner = p2pname_intro::client::join("127.0.0.1", intro_port, "127.0.0.1", base_port + 20)
        .await
        .expect("join should succeed");
    assert!(
        joiner.seeds.len() <= 5,
        "seed list must never exceed the sampling bound"
    );
}

/// S6 — a node only adds a contact to its routing table after pinging it
/// successfully; contacts surfaced at the edges of a `find_node` reply are
/// not implicitly trusted.
#[tokio::test]
#[ignore]
async fn s6_routing_table_updates_only_on_successful_ping() {
    let x = DhtNode::new("127.0.0.1", 19300);
    let y = DhtNode::new("127.0.0.1", 19301);
    let z = DhtNode::new("127.0.0.1", 19302);

    for node in [&x, &y, &z] {
        let node = node.clone();
        tokio::spawn(async move { node.serve().await });
    }
    settle().await;

    // Y already knows about Z (e.g. from Z pinging Y earlier).
    assert!(y.ping(&z.contact()).await, "Y should successfully ping Z");

    // X pings Y: this is the only action that should grow X's routing table.
    assert!(x.ping(&y.contact()).await, "X should successfully ping Y");
    assert_eq!(x.routing_table_len().await, 1);

    // X's find_node against Y's id will surface Z (known to Y) in the
    // reply, but Z must not appear in X's routing table until X pings it.
    let found = x.find_node(y.id()).await;
    assert!(
        found.iter().any(|c| c.id == z.id()),
        "the lookup should have discovered Z through Y"
    );
    assert_eq!(
        x.routing_table_len().await,
        1,
        "discovering Z through a lookup reply must not add it to X's routing table"
    );

    assert!(x.ping(&z.contact()).await, "X should successfully ping Z");
    assert_eq!(
        x.routing_table_len().await,
        2,
        "only the explicit ping should add Z"
    );
}
