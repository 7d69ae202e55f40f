//! In-memory document store.
//!
//! Backs the test suite and `--memory` sessions. Documents are kept in
//! insertion order per collection so unordered queries are deterministic.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::client::{StoreError, StoreResult};
use crate::document::{Document, StoredDocument, merge_patch, now_timestamp, replace_body, stamp_new};
use crate::query::Query;
use crate::store::DocumentStore;

#[derive(Debug, Clone)]
struct Entry {
    seq: u64,
    data: Document,
}

type Collections = HashMap<String, HashMap<String, Entry>>;

/// Volatile store; clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<Collections>>,
    seq: Arc<AtomicU64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection.
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, HashMap::len)
    }

    /// Number of documents across all collections.
    pub async fn total_documents(&self) -> usize {
        self.collections.read().await.values().map(HashMap::len).sum()
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn add(&self, collection: &str, mut data: Document) -> StoreResult<StoredDocument> {
        let id = Uuid::new_v4().to_string();
        stamp_new(&mut data, &now_timestamp());
        let entry = Entry {
            seq: self.next_seq(),
            data: data.clone(),
        };
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), entry);
        Ok(StoredDocument::new(id, data))
    }

    async fn set(&self, collection: &str, id: &str, data: Document) -> StoreResult<StoredDocument> {
        let mut guard = self.collections.write().await;
        let docs = guard.entry(collection.to_string()).or_default();
        let previous = docs.get(id);
        let body = replace_body(previous.map(|e| &e.data), data, &now_timestamp());
        let seq = match previous {
            Some(e) => e.seq,
            None => self.next_seq(),
        };
        docs.insert(
            id.to_string(),
            Entry {
                seq,
                data: body.clone(),
            },
        );
        Ok(StoredDocument::new(id, body))
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<StoredDocument>> {
        let guard = self.collections.read().await;
        Ok(guard
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|e| StoredDocument::new(id, e.data.clone())))
    }

    async fn update(&self, collection: &str, id: &str, patch: Document) -> StoreResult<StoredDocument> {
        let mut guard = self.collections.write().await;
        let entry = guard
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", collection, id)))?;
        merge_patch(&mut entry.data, patch, &now_timestamp());
        Ok(StoredDocument::new(id, entry.data.clone()))
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let mut guard = self.collections.write().await;
        Ok(guard
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .is_some())
    }

    async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<StoredDocument>> {
        let guard = self.collections.read().await;
        let Some(docs) = guard.get(collection) else {
            return Ok(Vec::new());
        };
        let mut entries: Vec<(&String, &Entry)> = docs.iter().collect();
        entries.sort_by_key(|(_, e)| e.seq);
        let candidates = entries
            .into_iter()
            .map(|(id, e)| StoredDocument::new(id.clone(), e.data.clone()))
            .collect();
        Ok(query.apply(candidates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{CREATED_AT, UPDATED_AT};
    use crate::query::Direction;
    use serde_json::json;

    fn body(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_add_stamps_timestamps_and_id() {
        let store = MemoryStore::new();
        let doc = store.add("projects", body(json!({"name": "A"}))).await.unwrap();
        assert!(!doc.id.is_empty());
        assert!(doc.data.contains_key(CREATED_AT));
        assert_eq!(doc.data[CREATED_AT], doc.data[UPDATED_AT]);
        assert_eq!(store.count("projects").await, 1);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update("projects", "nope", body(json!({"name": "B"})))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = MemoryStore::new();
        let doc = store
            .add("epics", body(json!({"title": "T", "color": "red"})))
            .await
            .unwrap();
        let updated = store
            .update("epics", &doc.id, body(json!({"color": "blue"})))
            .await
            .unwrap();
        assert_eq!(updated.data["title"], json!("T"));
        assert_eq!(updated.data["color"], json!("blue"));
        assert_eq!(updated.data[CREATED_AT], doc.data[CREATED_AT]);
    }

    #[tokio::test]
    async fn test_set_keeps_creation_and_position() {
        let store = MemoryStore::new();
        store.set("users", "u1", body(json!({"email": "a@x"}))).await.unwrap();
        store.add("users", body(json!({"email": "b@x"}))).await.unwrap();
        let first = store.get("users", "u1").await.unwrap().unwrap();
        let replaced = store.set("users", "u1", body(json!({"email": "c@x"}))).await.unwrap();
        assert_eq!(replaced.data[CREATED_AT], first.data[CREATED_AT]);

        let all = store.query("users", &Query::new()).await.unwrap();
        assert_eq!(all[0].id, "u1");
        assert_eq!(all[0].data["email"], json!("c@x"));
    }

    #[tokio::test]
    async fn test_query_insertion_order_and_sort() {
        let store = MemoryStore::new();
        for (name, rank) in [("x", 2), ("y", 1), ("z", 3)] {
            store
                .add("items", body(json!({"name": name, "rank": rank, "projectId": "p"})))
                .await
                .unwrap();
        }
        let names = |docs: Vec<StoredDocument>| -> Vec<String> {
            docs.into_iter()
                .map(|d| d.get_str("name").unwrap().to_string())
                .collect()
        };
        let unordered = store.query("items", &Query::new()).await.unwrap();
        assert_eq!(names(unordered), vec!["x", "y", "z"]);

        let sorted = store
            .query("items", &Query::new().where_eq("projectId", "p").order_by("rank", Direction::Desc))
            .await
            .unwrap();
        assert_eq!(names(sorted), vec!["z", "x", "y"]);
    }

    #[tokio::test]
    async fn test_delete_and_exists() {
        let store = MemoryStore::new();
        let doc = store.add("gapAnalyses", body(json!({"projectId": "p1"}))).await.unwrap();
        assert!(store.exists_where("gapAnalyses", "projectId", "p1").await.unwrap());
        assert!(store.delete("gapAnalyses", &doc.id).await.unwrap());
        assert!(!store.delete("gapAnalyses", &doc.id).await.unwrap());
        assert!(!store.exists_where("gapAnalyses", "projectId", "p1").await.unwrap());
    }
}
