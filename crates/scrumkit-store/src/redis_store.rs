//! Redis document store.
//!
//! Key layout, with `{ns}` the backend project id:
//! - `{ns}:{collection}:{id}`: hash, `data` field holds the JSON body
//! - `{ns}:{collection}:all`: sorted set of ids scored by creation time (ms)
//! - `{ns}:{collection}:by:{field}:{value}`: set of ids, for string fields
//!   named `*Id` and for `status`

use async_trait::async_trait;
use chrono::DateTime;
use redis::AsyncCommands;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::client::{RedisPool, StoreError, StoreResult, init_pool};
use crate::document::{
    CREATED_AT, Document, StoredDocument, merge_patch, now_timestamp, replace_body, stamp_new,
};
use crate::query::Query;
use crate::store::DocumentStore;

/// Redis-backed [`DocumentStore`].
#[derive(Clone)]
pub struct RedisStore {
    pool: RedisPool,
    namespace: String,
}

impl RedisStore {
    pub fn new(pool: RedisPool, namespace: impl Into<String>) -> Self {
        Self {
            pool,
            namespace: namespace.into(),
        }
    }

    /// Connect to `redis_url` and scope every key under `namespace`.
    pub async fn connect(redis_url: &str, namespace: &str) -> StoreResult<Self> {
        let pool = init_pool(redis_url).await?;
        Ok(Self::new(pool, namespace))
    }

    fn doc_key(&self, collection: &str, id: &str) -> String {
        format!("{}:{}:{}", self.namespace, collection, id)
    }

    fn all_key(&self, collection: &str) -> String {
        format!("{}:{}:all", self.namespace, collection)
    }

    fn index_key(&self, collection: &str, field: &str, value: &str) -> String {
        format!("{}:{}:by:{}:{}", self.namespace, collection, field, value)
    }

    async fn read(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let mut conn = self.pool.clone();
        let json: Option<String> = conn.hget(self.doc_key(collection, id), "data").await?;
        match json {
            Some(j) => match serde_json::from_str::<Value>(&j)? {
                Value::Object(map) => Ok(Some(map)),
                _ => Err(StoreError::InvalidDocument(format!("{}/{}", collection, id))),
            },
            None => Ok(None),
        }
    }

    /// Persist a body and reconcile the equality indexes against `previous`.
    async fn write(
        &self,
        collection: &str,
        id: &str,
        data: &Document,
        previous: Option<&Document>,
    ) -> StoreResult<()> {
        let mut conn = self.pool.clone();
        let json = serde_json::to_string(data)?;
        conn.hset::<_, _, _, ()>(self.doc_key(collection, id), "data", &json)
            .await?;

        let score = creation_score(data);
        conn.zadd::<_, _, _, ()>(self.all_key(collection), id, score)
            .await?;

        let old = previous.map(indexed_fields).unwrap_or_default();
        let new = indexed_fields(data);
        for (field, value) in old.iter().filter(|pair| !new.contains(pair)) {
            conn.srem::<_, _, ()>(self.index_key(collection, field, value), id)
                .await?;
        }
        for (field, value) in new.iter().filter(|pair| !old.contains(pair)) {
            conn.sadd::<_, _, ()>(self.index_key(collection, field, value), id)
                .await?;
        }
        Ok(())
    }

    async fn candidate_ids(&self, collection: &str, query: &Query) -> StoreResult<Vec<String>> {
        let mut conn = self.pool.clone();
        if let Some((field, value)) = query.index_filter().filter(|(f, _)| is_indexed(f)) {
            debug!(collection, field, value, "Serving query from index");
            let ids: Vec<String> = conn.smembers(self.index_key(collection, field, value)).await?;
            return Ok(ids);
        }
        let ids: Vec<String> = conn.zrange(self.all_key(collection), 0, -1).await?;
        Ok(ids)
    }
}

#[async_trait]
impl DocumentStore for RedisStore {
    async fn add(&self, collection: &str, mut data: Document) -> StoreResult<StoredDocument> {
        let id = Uuid::new_v4().to_string();
        stamp_new(&mut data, &now_timestamp());
        self.write(collection, &id, &data, None).await?;
        Ok(StoredDocument::new(id, data))
    }

    async fn set(&self, collection: &str, id: &str, data: Document) -> StoreResult<StoredDocument> {
        let previous = self.read(collection, id).await?;
        let body = replace_body(previous.as_ref(), data, &now_timestamp());
        self.write(collection, id, &body, previous.as_ref()).await?;
        Ok(StoredDocument::new(id, body))
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<StoredDocument>> {
        Ok(self
            .read(collection, id)
            .await?
            .map(|data| StoredDocument::new(id, data)))
    }

    async fn update(&self, collection: &str, id: &str, patch: Document) -> StoreResult<StoredDocument> {
        let previous = self
            .read(collection, id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", collection, id)))?;
        let mut merged = previous.clone();
        merge_patch(&mut merged, patch, &now_timestamp());
        self.write(collection, id, &merged, Some(&previous)).await?;
        Ok(StoredDocument::new(id, merged))
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let Some(previous) = self.read(collection, id).await? else {
            return Ok(false);
        };
        let mut conn = self.pool.clone();
        conn.del::<_, ()>(self.doc_key(collection, id)).await?;
        conn.zrem::<_, _, ()>(self.all_key(collection), id).await?;
        for (field, value) in indexed_fields(&previous) {
            conn.srem::<_, _, ()>(self.index_key(collection, &field, &value), id)
                .await?;
        }
        Ok(true)
    }

    async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<StoredDocument>> {
        let ids = self.candidate_ids(collection, query).await?;
        let mut docs = Vec::with_capacity(ids.len());
        for id in ids {
            // Index entries can outlive a document removed by another client.
            if let Some(data) = self.read(collection, &id).await? {
                docs.push(StoredDocument::new(id, data));
            }
        }
        // Set members come back unordered; restore creation order first.
        docs.sort_by(|a, b| a.get_str(CREATED_AT).cmp(&b.get_str(CREATED_AT)));
        Ok(query.apply(docs))
    }
}

fn is_indexed(field: &str) -> bool {
    field == "status" || (field.len() > 2 && field.ends_with("Id"))
}

fn indexed_fields(data: &Document) -> Vec<(String, String)> {
    data.iter()
        .filter(|(k, _)| is_indexed(k))
        .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
        .collect()
}

fn creation_score(data: &Document) -> i64 {
    data.get(CREATED_AT)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map_or(0, |dt| dt.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_indexed_fields() {
        let data = json!({
            "projectId": "p1",
            "sprintId": null,
            "status": "todo",
            "title": "x",
            "id": "ignored-by-length-rule"
        });
        let mut fields = indexed_fields(data.as_object().unwrap());
        fields.sort();
        assert_eq!(
            fields,
            vec![
                ("projectId".to_string(), "p1".to_string()),
                ("status".to_string(), "todo".to_string()),
            ]
        );
    }

    #[test]
    fn test_creation_score() {
        let data = json!({"createdAt": "1970-01-01T00:00:01.500Z"});
        assert_eq!(creation_score(data.as_object().unwrap()), 1500);
        assert_eq!(creation_score(&Document::new()), 0);
    }
}
