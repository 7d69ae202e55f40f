//! Collection queries.
//!
//! A backend answers at most one equality filter from an index; every other
//! filter, the ordering and the limit are applied in memory by [`Query::apply`].

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::StoredDocument;

/// Comparison used by a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    NotEq,
}

/// A single field predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    fn matches(&self, doc: &StoredDocument) -> bool {
        let actual = doc.field(&self.field).unwrap_or(Value::Null);
        match self.op {
            FilterOp::Eq => actual == self.value,
            FilterOp::NotEq => actual != self.value,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// Sort key.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// A collection query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field == value`.
    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.to_string(),
            op: FilterOp::Eq,
            value: value.into(),
        });
        self
    }

    /// Require `field != value`. Documents missing the field match.
    pub fn where_ne(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.to_string(),
            op: FilterOp::NotEq,
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.to_string(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The first equality filter on a string value, the one a backend may
    /// serve from an index.
    pub fn index_filter(&self) -> Option<(&str, &str)> {
        self.filters.iter().find_map(|f| match (f.op, &f.value) {
            (FilterOp::Eq, Value::String(v)) => Some((f.field.as_str(), v.as_str())),
            _ => None,
        })
    }

    /// Whether a document satisfies every filter.
    pub fn matches(&self, doc: &StoredDocument) -> bool {
        self.filters.iter().all(|f| f.matches(doc))
    }

    /// Filter, sort and truncate a candidate set.
    ///
    /// Sorting is stable, so candidates keep their incoming order on ties.
    pub fn apply(&self, docs: Vec<StoredDocument>) -> Vec<StoredDocument> {
        let mut out: Vec<StoredDocument> = docs.into_iter().filter(|d| self.matches(d)).collect();

        if let Some(order) = &self.order_by {
            out.sort_by(|a, b| {
                let ord = compare_fields(a.field(&order.field), b.field(&order.field));
                match (order.direction, ord) {
                    // Missing values go last in both directions.
                    (_, FieldOrdering::MissingLeft) => Ordering::Greater,
                    (_, FieldOrdering::MissingRight) => Ordering::Less,
                    (Direction::Asc, FieldOrdering::Present(o)) => o,
                    (Direction::Desc, FieldOrdering::Present(o)) => o.reverse(),
                }
            });
        }

        if let Some(limit) = self.limit {
            out.truncate(limit);
        }
        out
    }
}

enum FieldOrdering {
    Present(Ordering),
    MissingLeft,
    MissingRight,
}

fn compare_fields(a: Option<Value>, b: Option<Value>) -> FieldOrdering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => FieldOrdering::Present(Ordering::Equal),
        (None, Some(_)) => FieldOrdering::MissingLeft,
        (Some(_), None) => FieldOrdering::MissingRight,
        (Some(a), Some(b)) => FieldOrdering::Present(compare_values(&a, &b)),
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        // Mixed types: fall back to a stable textual comparison.
        _ => a.to_string().cmp(&b.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use serde_json::json;

    fn doc(id: &str, fields: Value) -> StoredDocument {
        let data: Document = fields.as_object().cloned().unwrap_or_default();
        StoredDocument::new(id, data)
    }

    fn sample() -> Vec<StoredDocument> {
        vec![
            doc("a", json!({"projectId": "p1", "status": "active", "rank": 3})),
            doc("b", json!({"projectId": "p1", "status": "archived", "rank": 1})),
            doc("c", json!({"projectId": "p2", "status": "active", "rank": 2})),
            doc("d", json!({"projectId": "p1", "status": "active"})),
        ]
    }

    #[test]
    fn test_equality_and_inequality() {
        let q = Query::new()
            .where_eq("projectId", "p1")
            .where_ne("status", "archived");
        let ids: Vec<String> = q.apply(sample()).into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["a", "d"]);
    }

    #[test]
    fn test_not_equal_matches_missing_field() {
        let q = Query::new().where_ne("color", "red");
        assert_eq!(q.apply(sample()).len(), 4);
    }

    #[test]
    fn test_sort_puts_missing_last() {
        let asc: Vec<String> = Query::new()
            .order_by("rank", Direction::Asc)
            .apply(sample())
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(asc, vec!["b", "c", "a", "d"]);

        let desc: Vec<String> = Query::new()
            .order_by("rank", Direction::Desc)
            .apply(sample())
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(desc, vec!["a", "c", "b", "d"]);
    }

    #[test]
    fn test_limit_and_id_filter() {
        let q = Query::new().where_eq("id", "c");
        assert_eq!(q.apply(sample())[0].id, "c");
        assert_eq!(Query::new().limit(2).apply(sample()).len(), 2);
    }

    #[test]
    fn test_index_filter_picks_first_string_equality() {
        let q = Query::new()
            .where_ne("status", "archived")
            .where_eq("rank", 3)
            .where_eq("projectId", "p1");
        assert_eq!(q.index_filter(), Some(("projectId", "p1")));
    }
}
