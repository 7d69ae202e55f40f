//! Scrumkit Document Store
//!
//! Flat JSON documents grouped in named collections, with a Redis backend
//! for deployments and an in-memory backend for tests and local sessions.

pub mod broadcast;
pub mod client;
pub mod document;
pub mod memory;
pub mod query;
pub mod redis_store;
pub mod store;

pub use broadcast::{
    ChangeEvent, ChangeKind, ChangeReceiver, ChangeSender, create_change_channel,
};
pub use client::{RedisPool, StoreError, StoreResult, init_pool};
pub use document::{CREATED_AT, Document, StoredDocument, UPDATED_AT, now_timestamp, to_document};
pub use memory::MemoryStore;
pub use query::{Direction, Filter, FilterOp, OrderBy, Query};
pub use redis_store::RedisStore;
pub use store::{DocumentStore, SharedStore};
