use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::document::Replicated;

/// Server-side bookkeeping wrapped around every stored document. None of it
/// ever reaches a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord<T> {
    pub doc: T,
    /// Unix millis. Survives replacement, like a creation timestamp should.
    pub created_at: u64,
    pub updated_at: u64,
    /// Bumped on every replacement of the document.
    pub revision: u32,
    /// Monotonic insertion counter, tiebreaker for same-millisecond inserts.
    pub seq: u64,
}

/// One replicated collection: a uuid-keyed map of records. This is the
/// in-memory form of a snapshot file; all semantics of upsert and restore
/// live here so they can be tested without any I/O.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection<T> {
    seq: u64,
    records: HashMap<String, StoredRecord<T>>,
}

impl<T: Replicated> Collection<T> {
    pub fn new() -> Self {
        Self {
            seq: 0,
            records: HashMap::new(),
        }
    }

    /// Number of stored records, tombstones included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, uuid: &str) -> Option<&StoredRecord<T>> {
        self.records.get(uuid)
    }

    /// Insert-or-replace keyed by uuid. Replacement swaps the whole document
    /// (no field merge); `created_at` and `seq` survive, `updated_at` and
    /// `revision` advance. Returns the document as stored.
    pub fn upsert(&mut self, doc: T, now_ms: u64) -> T {
        let uuid = doc.uuid().to_owned();
        if let Some(record) = self.records.get_mut(&uuid) {
            record.doc = doc;
            record.updated_at = now_ms;
            record.revision += 1;
            log::debug!("replaced {} in {} (rev {})", uuid, T::KIND, record.revision);
            return record.doc.clone();
        }
        self.seq += 1;
        log::debug!("inserted {} into {} (seq {})", uuid, T::KIND, self.seq);
        let record = StoredRecord {
            doc: doc.clone(),
            created_at: now_ms,
            updated_at: now_ms,
            revision: 0,
            seq: self.seq,
        };
        self.records.insert(uuid, record);
        doc
    }

    /// Non-deleted documents, newest first, at most `limit`, with
    /// server-internal fields stripped.
    pub fn fetch_active(&self, limit: usize) -> Vec<T> {
        let mut live: Vec<&StoredRecord<T>> = self
            .records
            .values()
            .filter(|record| !record.doc.is_deleted())
            .collect();
        live.sort_by(|a, b| (b.created_at, b.seq).cmp(&(a.created_at, a.seq)));
        live.into_iter()
            .take(limit)
            .map(|record| record.doc.redacted())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Card;

    fn card(uuid: &str, x: f64) -> Card {
        Card {
            uuid: uuid.into(),
            session: Some("room-1".into()),
            deleted: false,
            shape: 2.0,
            x,
            y: 5.0,
        }
    }

    #[test]
    fn it_includes_an_upserted_document_in_fetch() {
        let mut collection = Collection::new();
        collection.upsert(card("a1", 10.0), 1);
        let active = collection.fetch_active(100);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].uuid, "a1");
        assert_eq!(active[0].x, 10.0);
    }

    #[test]
    fn it_replaces_the_whole_document_on_upsert() {
        let mut collection = Collection::new();
        collection.upsert(card("a1", 10.0), 1);
        let mut second = card("a1", 42.0);
        second.shape = 7.0;
        collection.upsert(second.clone(), 2);

        assert_eq!(collection.len(), 1);
        let record = collection.get("a1").expect("must exist");
        assert_eq!(record.doc, second);
        assert_eq!(record.revision, 1);
        assert_eq!(record.created_at, 1);
        assert_eq!(record.updated_at, 2);
    }

    #[test]
    fn it_never_returns_tombstones() {
        let mut collection = Collection::new();
        collection.upsert(card("a1", 10.0), 1);
        let mut dead = card("a1", 10.0);
        dead.deleted = true;
        collection.upsert(dead, 2);
        assert!(collection.fetch_active(100).is_empty());
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn it_orders_newest_first_and_respects_the_limit() {
        let mut collection = Collection::new();
        collection.upsert(card("a1", 1.0), 10);
        collection.upsert(card("a2", 2.0), 20);
        collection.upsert(card("a3", 3.0), 20);
        collection.upsert(card("a4", 4.0), 30);

        let active = collection.fetch_active(3);
        let uuids: Vec<&str> = active.iter().map(|c| c.uuid.as_str()).collect();
        // a3 wins the tie against a2 by insertion order
        assert_eq!(uuids, vec!["a4", "a3", "a2"]);
    }

    #[test]
    fn it_keeps_the_creation_order_under_replacement() {
        let mut collection = Collection::new();
        collection.upsert(card("a1", 1.0), 10);
        collection.upsert(card("a2", 2.0), 20);
        // replacing a1 later must not make it "newer" than a2
        collection.upsert(card("a1", 9.0), 30);

        let active = collection.fetch_active(10);
        let uuids: Vec<&str> = active.iter().map(|c| c.uuid.as_str()).collect();
        assert_eq!(uuids, vec!["a2", "a1"]);
    }

    #[test]
    fn it_strips_the_session_field_from_fetched_cards() {
        let mut collection = Collection::new();
        collection.upsert(card("a1", 10.0), 1);
        assert_eq!(collection.fetch_active(100)[0].session, None);
    }
}
