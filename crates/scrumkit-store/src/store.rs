//! The document store interface.

use std::sync::Arc;

use async_trait::async_trait;

use crate::client::StoreResult;
use crate::document::{Document, StoredDocument};
use crate::query::Query;

/// Collection-oriented document database.
///
/// Timestamps are stamped by the store, never by callers. Writes are
/// single-document; there is no version check, so the last writer wins.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert under a generated identifier, stamping `createdAt` and `updatedAt`.
    async fn add(&self, collection: &str, data: Document) -> StoreResult<StoredDocument>;

    /// Create or fully replace a document under a known identifier.
    /// An existing document keeps its original `createdAt`.
    async fn set(&self, collection: &str, id: &str, data: Document) -> StoreResult<StoredDocument>;

    /// Fetch by identifier.
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<StoredDocument>>;

    /// Shallow-merge `patch` into an existing document and stamp `updatedAt`.
    /// Fails with `NotFound` when the document does not exist.
    async fn update(&self, collection: &str, id: &str, patch: Document) -> StoreResult<StoredDocument>;

    /// Hard delete. Returns whether a document was removed.
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool>;

    /// Run a query against a collection.
    async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<StoredDocument>>;

    /// Cheap existence probe on a single equality.
    async fn exists_where(&self, collection: &str, field: &str, value: &str) -> StoreResult<bool> {
        let query = Query::new().where_eq(field, value).limit(1);
        Ok(!self.query(collection, &query).await?.is_empty())
    }
}

/// Shared handle injected into services and handlers.
pub type SharedStore = Arc<dyn DocumentStore>;
