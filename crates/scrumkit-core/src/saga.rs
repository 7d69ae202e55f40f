//! Compensating deletes for multi-document creates.
//!
//! The store has no cross-document transactions. A `Saga` remembers every
//! document created during a multi-step operation so that a failure part
//! way through can remove them again, newest first.

use scrumkit_store::DocumentStore;
use tracing::{debug, warn};

/// Ledger of documents created by one logical operation.
pub struct Saga<'a> {
    store: &'a dyn DocumentStore,
    name: String,
    created: Vec<(&'static str, String)>,
}

impl<'a> Saga<'a> {
    pub fn new(store: &'a dyn DocumentStore, name: impl Into<String>) -> Self {
        Self {
            store,
            name: name.into(),
            created: Vec::new(),
        }
    }

    /// Record a document created as part of this operation.
    pub fn record(&mut self, collection: &'static str, id: &str) {
        debug!(saga = %self.name, collection, id, "Recorded step");
        self.created.push((collection, id.to_string()));
    }

    /// Number of recorded documents.
    pub fn len(&self) -> usize {
        self.created.len()
    }

    pub fn is_empty(&self) -> bool {
        self.created.is_empty()
    }

    /// Keep everything that was created.
    pub fn commit(self) -> usize {
        debug!(saga = %self.name, documents = self.created.len(), "Committed");
        self.created.len()
    }

    /// Delete every recorded document in reverse creation order.
    ///
    /// Failures are logged and skipped; returns how many documents were
    /// actually removed.
    pub async fn compensate(self) -> usize {
        let mut removed = 0;
        for (collection, id) in self.created.iter().rev() {
            match self.store.delete(collection, id).await {
                Ok(true) => removed += 1,
                Ok(false) => debug!(saga = %self.name, collection, id = %id, "Already gone"),
                Err(e) => warn!(
                    saga = %self.name,
                    collection,
                    id = %id,
                    error = %e,
                    "Compensating delete failed"
                ),
            }
        }
        warn!(
            saga = %self.name,
            removed,
            recorded = self.created.len(),
            "Rolled back partial operation"
        );
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrumkit_store::{Document, MemoryStore};

    #[tokio::test]
    async fn test_compensate_removes_recorded_documents() {
        let store = MemoryStore::new();
        let keep = store.add("projects", Document::new()).await.unwrap();
        let mut saga = Saga::new(&store, "test");
        let a = store.add("projects", Document::new()).await.unwrap();
        saga.record("projects", &a.id);
        let b = store.add("epics", Document::new()).await.unwrap();
        saga.record("epics", &b.id);
        // Already removed by someone else; must not abort the rollback.
        saga.record("epics", "vanished");

        assert_eq!(saga.len(), 3);
        assert_eq!(saga.compensate().await, 2);
        assert_eq!(store.total_documents().await, 1);
        assert!(store.get("projects", &keep.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_commit_keeps_documents() {
        let store = MemoryStore::new();
        let mut saga = Saga::new(&store, "test");
        let a = store.add("projects", Document::new()).await.unwrap();
        saga.record("projects", &a.id);
        assert_eq!(saga.commit(), 1);
        assert_eq!(store.count("projects").await, 1);
    }
}
