//! A single k-bucket: a bounded, LRU-ordered list of contacts.

use std::collections::VecDeque;

use p2pname_types::Contact;

use crate::K;

/// Up to `K` contacts, least-recently-seen at the front.
///
/// Insertion policy is the simple fixed one: when the bucket is full, a new
/// contact is dropped rather than challenging the least-recently-seen entry
/// with a ping. No duplicate ids are ever held.
#[derive(Clone, Debug, Default)]
pub struct KBucket {
    contacts: VecDeque<Contact>,
}

impl KBucket {
    /// An empty bucket.
    pub fn new() -> Self {
        Self {
            contacts: VecDeque::with_capacity(K),
        }
    }

    /// Record activity for `contact`.
    ///
    /// If its id is already present, move it to the most-recently-seen end
    /// (and refresh its recorded address). Otherwise, append it if there is
    /// room; if the bucket is full, drop the insertion and keep the existing
    /// contacts untouched.
    ///
    /// Returns whether the bucket has room for a further insertion after
    /// this call (`len < K`).
    pub fn touch(&mut self, contact: Contact) -> bool {
        if let Some(index) = self.contacts.iter().position(|c| c.id == contact.id) {
            self.contacts.remove(index);
            self.contacts.push_back(contact);
        } else if self.contacts.len() < K {
            self.contacts.push_back(contact);
        }
        self.contacts.len() < K
    }

    /// Snapshot of the held contacts, least-recently-seen first.
    pub fn contacts(&self) -> Vec<Contact> {
        self.contacts.iter().cloned().collect()
    }

    /// Number of contacts currently held.
    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    /// Whether the bucket holds no contacts.
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use p2pname_types::Id;

    fn contact(byte: u8) -> Contact {
        Contact::new(Id::from_bytes([byte; 20]), "127.0.0.1", 9000 + u16::from(byte))
    }

    #[test]
    fn touch_appends_new_contacts_at_the_back() {
        let mut bucket = KBucket::new();
        bucket.touch(contact(1));
        bucket.touch(contact(2));
        let ids: Vec<_> = bucket.contacts().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![contact(1).id, contact(2).id]);
    }

    #[test]
    fn touch_moves_existing_contact_to_back() {
        let mut bucket = KBucket::new();
        bucket.touch(contact(1));
        bucket.touch(contact(2));
        bucket.touch(contact(1));
        let ids: Vec<_> = bucket.contacts().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![contact(2).id, contact(1).id]);
    }

    #[test]
    fn touch_drops_insertion_when_full() {
        let mut bucket = KBucket::new();
        for i in 0..K {
            bucket.touch(contact(i as u8));
        }
        assert_eq!(bucket.len(), K);

        let has_room = bucket.touch(contact(200));
        assert!(!has_room);
        assert_eq!(bucket.len(), K);
        assert!(bucket.contacts().iter().all(|c| c.id != contact(200).id));
    }

    #[test]
    fn no_duplicate_ids() {
        let mut bucket = KBucket::new();
        for _ in 0..5 {
            bucket.touch(contact(7));
        }
        assert_eq!(bucket.len(), 1);
    }
}
