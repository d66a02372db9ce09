//! Concurrent `STOR` fan-out to remote contacts.

use futures::future::join_all;
use p2pname_types::{Contact, Id};
use tracing::debug;

/// Issue a `STOR` RPC to every contact in `remote`, concurrently, and await
/// them all before returning. Individual failures are logged and otherwise
/// swallowed — partial replication is acceptable and never retried.
pub async fn store_remote(remote: &[Contact], key: Id, value: &str) {
    let probes = remote
        .iter()
        .map(|c| p2pname_rpc::tcp::store(&c.ip, c.port, key, value.to_string()));
    let results = join_all(probes).await;

    for (contact, result) in remote.iter().zip(results) {
        match result {
            Ok(true) => {}
            Ok(false) => debug!(peer = %contact.id, "STOR rejected by peer"),
            Err(e) => debug!(peer = %contact.id, error = %e, "STOR failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_remote_contact_does_not_panic_or_propagate() {
        let key = Id::hash("key");
        // Port 1 on loopback never accepts connections in this test process.
        let remote = vec![Contact::new(Id::hash("remote"), "127.0.0.1", 1)];
        store_remote(&remote, key, "value").await;
    }

    #[tokio::test]
    async fn empty_remote_list_is_a_no_op() {
        store_remote(&[], Id::hash("key"), "value").await;
    }
}
