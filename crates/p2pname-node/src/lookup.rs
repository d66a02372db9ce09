//! Shared iterative lookup driver for `find_node` and `find_value`.
//!
//! Each round probes up to `ALPHA` not-yet-queried contacts concurrently and
//! waits for every probe to settle before advancing — no speculative next
//! round, matching the node's single-threaded cooperative scheduling model.

use std::collections::HashSet;

use futures::future::join_all;
use p2pname_kademlia::ALPHA;
use p2pname_rpc::codec::LookupReply;
use p2pname_types::{Contact, Id};
use tracing::debug;

const RESULT_COUNT: usize = p2pname_kademlia::K;

/// Drives one iterative lookup to convergence.
pub struct IterativeLookup {
    target: Id,
    shortlist: Vec<Contact>,
    queried: HashSet<Id>,
}

impl IterativeLookup {
    /// Start a lookup for `target`, seeded with the local routing table's
    /// closest-known contacts.
    pub fn new(target: Id, seed: Vec<Contact>) -> Self {
        let mut lookup = Self {
            target,
            shortlist: Vec::new(),
            queried: HashSet::new(),
        };
        lookup.merge(seed);
        lookup
    }

    fn next_batch(&self) -> Vec<Contact> {
        self.shortlist
            .iter()
            .filter(|c| !self.queried.contains(&c.id))
            .take(ALPHA)
            .cloned()
            .collect()
    }

    fn merge(&mut self, discovered: Vec<Contact>) {
        self.shortlist.extend(discovered);
        let target = self.target;
        self.shortlist.sort_by(|a, b| {
            target
                .distance(&a.id)
                .cmp(&target.distance(&b.id))
                .then_with(|| a.id.cmp(&b.id))
        });
        self.shortlist.dedup_by(|a, b| a.id == b.id);
        self.shortlist.truncate(RESULT_COUNT);
    }

    /// Run to convergence, collecting the `K` closest contacts found.
    ///
    /// Used by `find_node`. Discovered contacts are never implicitly added
    /// to the routing table — only a successful `ping` does that.
    pub async fn run_find_node(mut self) -> Vec<Contact> {
        loop {
            let batch = self.next_batch();
            if batch.is_empty() {
                break;
            }

            let probes = batch
                .iter()
                .map(|c| p2pname_rpc::tcp::find_node(&c.ip, c.port, self.target));
            let results = join_all(probes).await;

            for (contact, result) in batch.iter().zip(results) {
                self.queried.insert(contact.id);
                match result {
                    Ok(nodes) => self.merge(nodes),
                    Err(e) => debug!(peer = %contact.id, error = %e, "find_node probe failed"),
                }
            }
        }
        self.shortlist
    }

    /// Run to convergence or until a value is found.
    ///
    /// Used by `find_value`. Terminates immediately on the first value hit
    /// from any probed contact.
    pub async fn run_find_value(mut self) -> (Option<String>, Vec<Contact>) {
        loop {
            let batch = self.next_batch();
            if batch.is_empty() {
                break;
            }

            let probes = batch
                .iter()
                .map(|c| p2pname_rpc::tcp::find_value(&c.ip, c.port, self.target));
            let results = join_all(probes).await;

            for (contact, result) in batch.iter().zip(results) {
                self.queried.insert(contact.id);
                match result {
                    Ok(LookupReply::Value(value)) => return (Some(value), self.shortlist),
                    Ok(LookupReply::Nodes(nodes)) => self.merge(nodes),
                    Err(e) => debug!(peer = %contact.id, error = %e, "find_value probe failed"),
                }
            }
        }
        (None, self.shortlist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(byte: u8) -> Contact {
        Contact::new(Id::from_bytes([byte; 20]), "127.0.0.1", 9000 + u16::from(byte))
    }

    #[test]
    fn merge_dedupes_and_sorts_by_distance() {
        let target = Id::from_bytes([0u8; 20]);
        let mut lookup = IterativeLookup::new(target, vec![contact(5), contact(1)]);
        lookup.merge(vec![contact(5), contact(3)]);

        let ids: Vec<_> = lookup.shortlist.iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), 3);
        for window in lookup.shortlist.windows(2) {
            let da = target.distance(&window[0].id);
            let db = target.distance(&window[1].id);
            assert!(da <= db);
        }
    }

    #[test]
    fn next_batch_excludes_already_queried_and_caps_at_alpha() {
        let target = Id::from_bytes([0u8; 20]);
        let seed: Vec<_> = (1..=10u8).map(contact).collect();
        let mut lookup = IterativeLookup::new(target, seed);
        let batch = lookup.next_batch();
        assert_eq!(batch.len(), ALPHA);

        for c in &batch {
            lookup.queried.insert(c.id);
        }
        let second = lookup.next_batch();
        assert!(second.iter().all(|c| !batch.iter().any(|b| b.id == c.id)));
    }

    #[test]
    fn empty_seed_yields_empty_batch() {
        let target = Id::from_bytes([0u8; 20]);
        let lookup = IterativeLookup::new(target, Vec::new());
        assert!(lookup.next_batch().is_empty());
    }
}
