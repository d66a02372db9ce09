//! The Kademlia routing table: 160 k-buckets owned by one node.

use p2pname_types::{Contact, Id, ID_BITS};

use crate::bucket::KBucket;
use crate::K;

/// Routing table for a single DHT node, indexed by XOR-prefix distance from
/// `self_id`. Exactly [`p2pname_types::ID_BITS`] buckets; the node's own id
/// is never inserted.
pub struct RoutingTable {
    self_id: Id,
    buckets: Vec<KBucket>,
}

impl RoutingTable {
    /// An empty table for the given local id.
    pub fn new(self_id: Id) -> Self {
        Self {
            self_id,
            buckets: (0..ID_BITS).map(|_| KBucket::new()).collect(),
        }
    }

    /// The local node's id.
    pub fn self_id(&self) -> Id {
        self.self_id
    }

    /// Insert or refresh `contact`. Silently ignored if `contact.id ==
    /// self_id`.
    pub fn add(&mut self, contact: Contact) {
        if let Some(index) = self.self_id.bucket_index(&contact.id) {
            self.buckets[index].touch(contact);
        }
    }

    /// Up to `K` contacts ordered by ascending XOR distance to `target`.
    ///
    /// Starts from `target`'s own bucket, then walks outward by symmetric
    /// index offsets until at least `K` contacts have been accumulated or
    /// every bucket has been visited, then sorts and truncates. Ties are
    /// broken by lower id.
    pub fn find_closest(&self, target: &Id) -> Vec<Contact> {
        let mut collected: Vec<Contact> = Vec::new();

        match self.self_id.bucket_index(target) {
            Some(start) => {
                collected.extend(self.buckets[start].contacts());

                let mut offset: usize = 1;
                while collected.len() < K && offset <= ID_BITS {
                    let mut any_in_range = false;
                    if start >= offset {
                        collected.extend(self.buckets[start - offset].contacts());
                        any_in_range = true;
                    }
                    if start + offset < ID_BITS {
                        collected.extend(self.buckets[start + offset].contacts());
                        any_in_range = true;
                    }
                    if !any_in_range {
                        break;
                    }
                    offset += 1;
                }
            }
            None => {
                // target == self_id: every bucket is equally a candidate,
                // so just gather everything.
                for bucket in &self.buckets {
                    collected.extend(bucket.contacts());
                }
            }
        }

        collected.sort_by(|a, b| {
            let da = target.distance(&a.id);
            let db = target.distance(&b.id);
            da.cmp(&db).then_with(|| a.id.cmp(&b.id))
        });
        collected.dedup_by(|a, b| a.id == b.id);
        collected.truncate(K);
        collected
    }

    /// Total number of contacts held across all buckets.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(KBucket::len).sum()
    }

    /// Whether the table holds no contacts.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
