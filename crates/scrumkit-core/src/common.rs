//! Types shared by the planning services.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use scrumkit_store::{Direction, Query, StoreResult, StoredDocument};

use crate::collections::PROJECT_ID;

/// Status value used for soft deletes.
pub const ARCHIVED: &str = "archived";

/// Work item priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// Read-model options for listing the documents of a project.
///
/// Callers describe what they want; the store decides how much of it is
/// answered by an index and how much in memory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListOptions {
    /// Only return documents with this exact status.
    pub status: Option<String>,
    /// Include soft-deleted documents. Ignored when `status` is set.
    pub include_archived: bool,
    /// Field to sort by (camelCase document field).
    pub sort: Option<String>,
    pub direction: Option<Direction>,
    pub limit: Option<usize>,
}

impl ListOptions {
    pub fn with_status(status: &str) -> Self {
        Self {
            status: Some(status.to_string()),
            ..Self::default()
        }
    }

    pub fn sorted_by(mut self, field: &str, direction: Direction) -> Self {
        self.sort = Some(field.to_string());
        self.direction = Some(direction);
        self
    }

    /// Build the store query for documents where `field == value`.
    pub fn to_query(&self, field: &str, value: &str, default_sort: (&str, Direction)) -> Query {
        let mut query = Query::new().where_eq(field, value);

        query = match &self.status {
            Some(status) => query.where_eq("status", status.as_str()),
            None if !self.include_archived => query.where_ne("status", ARCHIVED),
            None => query,
        };

        let sort_field = self.sort.as_deref().unwrap_or(default_sort.0);
        let direction = match (&self.sort, self.direction) {
            (_, Some(direction)) => direction,
            (None, None) => default_sort.1,
            (Some(_), None) => Direction::Asc,
        };
        query = query.order_by(sort_field, direction);

        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        query
    }

    /// Shorthand for the common project-scoped listing.
    pub fn project_query(&self, project_id: &str, default_sort: (&str, Direction)) -> Query {
        self.to_query(PROJECT_ID, project_id, default_sort)
    }
}

/// Decode a batch of documents into typed records.
pub(crate) fn decode_all<T: DeserializeOwned>(docs: Vec<StoredDocument>) -> StoreResult<Vec<T>> {
    docs.into_iter().map(StoredDocument::decode).collect()
}

/// Reject blank required text fields.
pub(crate) fn require_text(field: &str, value: &str) -> crate::CoreResult<()> {
    if value.trim().is_empty() {
        return Err(crate::CoreError::validation(format!("{} is required", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrumkit_store::FilterOp;
    use serde_json::json;

    #[test]
    fn test_default_excludes_archived() {
        let q = ListOptions::default().project_query("p1", ("createdAt", Direction::Asc));
        assert_eq!(q.filters.len(), 2);
        assert_eq!(q.filters[1].op, FilterOp::NotEq);
        assert_eq!(q.filters[1].value, json!("archived"));
        assert_eq!(q.order_by.as_ref().unwrap().field, "createdAt");
    }

    #[test]
    fn test_status_filter_overrides_archived_flag() {
        let q = ListOptions::with_status("archived").project_query("p1", ("createdAt", Direction::Asc));
        assert_eq!(q.filters[1].op, FilterOp::Eq);
        assert_eq!(q.filters[1].value, json!("archived"));
    }

    #[test]
    fn test_explicit_sort_defaults_to_ascending() {
        let opts = ListOptions {
            sort: Some("title".into()),
            ..ListOptions::default()
        };
        let q = opts.project_query("p1", ("updatedAt", Direction::Desc));
        let order = q.order_by.unwrap();
        assert_eq!(order.field, "title");
        assert_eq!(order.direction, Direction::Asc);
    }

    #[test]
    fn test_list_options_from_query_string_json() {
        let opts: ListOptions =
            serde_json::from_value(json!({"includeArchived": true, "sort": "priority", "direction": "desc"}))
                .unwrap();
        assert!(opts.include_archived);
        assert_eq!(opts.direction, Some(Direction::Desc));
    }

    #[test]
    fn test_priority_parse() {
        assert_eq!(Priority::from_str("HIGH"), Some(Priority::High));
        assert_eq!(Priority::from_str("urgent"), None);
        assert!(Priority::Critical > Priority::Low);
    }
}
