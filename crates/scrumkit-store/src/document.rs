//! Document representation and (de)serialization helpers.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::client::{StoreError, StoreResult};

/// A document body: a flat JSON object keyed by field name.
pub type Document = serde_json::Map<String, Value>;

/// Server-stamped creation timestamp field.
pub const CREATED_AT: &str = "createdAt";

/// Server-stamped last-write timestamp field.
pub const UPDATED_AT: &str = "updatedAt";

const ID_FIELD: &str = "id";

/// A document together with its identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub data: Document,
}

impl StoredDocument {
    pub fn new(id: impl Into<String>, data: Document) -> Self {
        Self { id: id.into(), data }
    }

    /// Read a top-level field. `id` resolves to the document identifier.
    pub fn field(&self, name: &str) -> Option<Value> {
        if name == ID_FIELD {
            return Some(Value::String(self.id.clone()));
        }
        self.data.get(name).cloned()
    }

    /// Read a top-level string field.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.data.get(name).and_then(Value::as_str)
    }

    /// Decode into a typed record. The identifier is injected as `id`.
    pub fn decode<T: DeserializeOwned>(self) -> StoreResult<T> {
        let mut data = self.data;
        data.insert(ID_FIELD.to_string(), Value::String(self.id));
        Ok(serde_json::from_value(Value::Object(data))?)
    }
}

/// Encode a typed value as a document body. Any `id` field is dropped,
/// since identifiers live outside the body.
pub fn to_document<T: Serialize>(value: &T) -> StoreResult<Document> {
    match serde_json::to_value(value)? {
        Value::Object(mut map) => {
            map.remove(ID_FIELD);
            Ok(map)
        }
        other => Err(StoreError::InvalidDocument(format!(
            "expected a JSON object, got {}",
            value_kind(&other)
        ))),
    }
}

/// Current server time as an RFC 3339 string with millisecond precision.
///
/// The fixed width keeps lexicographic and chronological order identical.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Stamp both timestamps on a new document.
pub(crate) fn stamp_new(data: &mut Document, now: &str) {
    data.remove(ID_FIELD);
    data.insert(CREATED_AT.to_string(), Value::String(now.to_string()));
    data.insert(UPDATED_AT.to_string(), Value::String(now.to_string()));
}

/// Shallow merge of `patch` into `base`, stamping `updatedAt`.
///
/// `createdAt` and `id` in the patch are ignored.
pub(crate) fn merge_patch(base: &mut Document, mut patch: Document, now: &str) {
    patch.remove(ID_FIELD);
    patch.remove(CREATED_AT);
    for (key, value) in patch {
        base.insert(key, value);
    }
    base.insert(UPDATED_AT.to_string(), Value::String(now.to_string()));
}

/// Build the body for a full replace, preserving `createdAt` from `previous`.
pub(crate) fn replace_body(previous: Option<&Document>, mut data: Document, now: &str) -> Document {
    stamp_new(&mut data, now);
    if let Some(created) = previous.and_then(|p| p.get(CREATED_AT)) {
        data.insert(CREATED_AT.to_string(), created.clone());
    }
    data
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Item {
        #[serde(default)]
        id: String,
        project_id: String,
        title: String,
    }

    #[test]
    fn test_to_document_drops_id() {
        let item = Item {
            id: "abc".into(),
            project_id: "p1".into(),
            title: "T".into(),
        };
        let doc = to_document(&item).unwrap();
        assert!(!doc.contains_key("id"));
        assert_eq!(doc["projectId"], json!("p1"));
    }

    #[test]
    fn test_to_document_rejects_scalars() {
        let err = to_document(&42).unwrap_err();
        assert!(matches!(err, StoreError::InvalidDocument(_)));
    }

    #[test]
    fn test_decode_injects_id() {
        let mut data = Document::new();
        data.insert("projectId".into(), json!("p1"));
        data.insert("title".into(), json!("Hello"));
        let item: Item = StoredDocument::new("doc-1", data).decode().unwrap();
        assert_eq!(item.id, "doc-1");
        assert_eq!(item.title, "Hello");
    }

    #[test]
    fn test_merge_keeps_created_at() {
        let mut base = Document::new();
        stamp_new(&mut base, "2024-01-01T00:00:00.000Z");
        let mut patch = Document::new();
        patch.insert(CREATED_AT.into(), json!("1999-01-01T00:00:00.000Z"));
        patch.insert("title".into(), json!("New"));
        merge_patch(&mut base, patch, "2024-02-01T00:00:00.000Z");
        assert_eq!(base[CREATED_AT], json!("2024-01-01T00:00:00.000Z"));
        assert_eq!(base[UPDATED_AT], json!("2024-02-01T00:00:00.000Z"));
        assert_eq!(base["title"], json!("New"));
    }

    #[test]
    fn test_replace_preserves_original_creation() {
        let mut previous = Document::new();
        stamp_new(&mut previous, "2024-01-01T00:00:00.000Z");
        let body = replace_body(Some(&previous), Document::new(), "2024-03-01T00:00:00.000Z");
        assert_eq!(body[CREATED_AT], json!("2024-01-01T00:00:00.000Z"));
        assert_eq!(body[UPDATED_AT], json!("2024-03-01T00:00:00.000Z"));
    }
}
