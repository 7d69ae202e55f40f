//! Discovery canvases.
//!
//! Each project has at most one canvas of each kind. The store does not
//! enforce that; [`save_canvas`] keeps it by updating the first document
//! found for the project instead of adding another.

pub mod bmc;
pub mod gap;
pub mod vpc;
pub mod vsm;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use scrumkit_store::{Direction, DocumentStore, Query, to_document};

use crate::collections::{
    BUSINESS_MODEL_CANVASES, GAP_ANALYSES, PROJECT_ID, VALUE_PROPOSITION_CANVASES, VALUE_STREAM_MAPS,
};
use crate::common::decode_all;
use crate::error::{CoreError, CoreResult, StoreResultExt};

pub use bmc::BusinessModelCanvas;
pub use gap::{ActionItem, ActionStatus, GapAnalysis, GapItem};
pub use vpc::ValuePropositionCanvas;
pub use vsm::{ProcessStep, ValueStreamMap, VsmMetrics};

/// The four canvas kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanvasKind {
    #[serde(rename = "bmc")]
    BusinessModel,
    #[serde(rename = "vpc")]
    ValueProposition,
    #[serde(rename = "vsm")]
    ValueStream,
    #[serde(rename = "gap")]
    GapAnalysis,
}

impl CanvasKind {
    pub const ALL: [CanvasKind; 4] = [
        Self::BusinessModel,
        Self::ValueProposition,
        Self::ValueStream,
        Self::GapAnalysis,
    ];

    pub fn collection(&self) -> &'static str {
        match self {
            Self::BusinessModel => BUSINESS_MODEL_CANVASES,
            Self::ValueProposition => VALUE_PROPOSITION_CANVASES,
            Self::ValueStream => VALUE_STREAM_MAPS,
            Self::GapAnalysis => GAP_ANALYSES,
        }
    }

    /// Short name used in URLs and on the command line.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::BusinessModel => "bmc",
            Self::ValueProposition => "vpc",
            Self::ValueStream => "vsm",
            Self::GapAnalysis => "gap",
        }
    }

    pub fn from_slug(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "bmc" | "business-model" => Some(Self::BusinessModel),
            "vpc" | "value-proposition" => Some(Self::ValueProposition),
            "vsm" | "value-stream" => Some(Self::ValueStream),
            "gap" | "gap-analysis" => Some(Self::GapAnalysis),
            _ => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::BusinessModel => "Business Model Canvas",
            Self::ValueProposition => "Value Proposition Canvas",
            Self::ValueStream => "Value Stream Map",
            Self::GapAnalysis => "Gap Analysis",
        }
    }
}

/// Canvas body stored in its kind's collection.
pub trait Canvas: Serialize + DeserializeOwned + Clone + Default + Send + Sync {
    const KIND: CanvasKind;

    /// Tidy user input before saving: trim text, assign missing item ids.
    fn normalize(&mut self) {}
}

/// A saved canvas together with its document metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasRecord<T> {
    pub id: String,
    pub project_id: String,
    #[serde(flatten)]
    pub canvas: T,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn project_query(project_id: &str) -> Query {
    Query::new()
        .where_eq(PROJECT_ID, project_id)
        .order_by("createdAt", Direction::Asc)
}

/// The canvas of a project, if one was saved.
pub async fn get_canvas<T: Canvas>(
    store: &dyn DocumentStore,
    project_id: &str,
) -> CoreResult<Option<CanvasRecord<T>>> {
    let docs = store
        .query(T::KIND.collection(), &project_query(project_id).limit(1))
        .await
        .or_backend("Could not load the canvas.")?;
    let mut records: Vec<CanvasRecord<T>> =
        decode_all(docs).or_backend("Could not read the canvas.")?;
    Ok(records.pop())
}

/// Create or update the canvas of a project.
pub async fn save_canvas<T: Canvas>(
    store: &dyn DocumentStore,
    project_id: &str,
    canvas: &T,
) -> CoreResult<CanvasRecord<T>> {
    let mut canvas = canvas.clone();
    canvas.normalize();

    let mut body = to_document(&canvas).or_backend("Could not save the canvas.")?;
    body.insert(PROJECT_ID.into(), Value::String(project_id.to_string()));

    let collection = T::KIND.collection();
    let existing = store
        .query(collection, &project_query(project_id).limit(1))
        .await
        .or_backend("Could not save the canvas.")?;

    let doc = match existing.first() {
        Some(current) => {
            debug!(kind = T::KIND.slug(), project_id, id = %current.id, "Updating canvas");
            store
                .update(collection, &current.id, body)
                .await
                .or_backend("Could not save the canvas.")?
        }
        None => {
            let doc = store
                .add(collection, body)
                .await
                .or_backend("Could not save the canvas.")?;
            info!(kind = T::KIND.slug(), project_id, id = %doc.id, "Canvas created");
            doc
        }
    };
    doc.decode().or_backend("Could not read the canvas.")
}

/// Remove the canvas of a project. Stray duplicates are removed too.
pub async fn delete_canvas(store: &dyn DocumentStore, kind: CanvasKind, project_id: &str) -> CoreResult<bool> {
    let collection = kind.collection();
    let docs = store
        .query(collection, &project_query(project_id))
        .await
        .or_backend("Could not delete the canvas.")?;
    if docs.len() > 1 {
        warn!(kind = kind.slug(), project_id, count = docs.len(), "Project had duplicate canvases");
    }
    let mut removed = false;
    for doc in docs {
        removed |= store
            .delete(collection, &doc.id)
            .await
            .or_backend("Could not delete the canvas.")?;
    }
    Ok(removed)
}

/// Which canvases a project has filled in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasStatus {
    pub business_model: bool,
    pub value_proposition: bool,
    pub value_stream: bool,
    pub gap_analysis: bool,
}

impl CanvasStatus {
    pub fn has(&self, kind: CanvasKind) -> bool {
        match kind {
            CanvasKind::BusinessModel => self.business_model,
            CanvasKind::ValueProposition => self.value_proposition,
            CanvasKind::ValueStream => self.value_stream,
            CanvasKind::GapAnalysis => self.gap_analysis,
        }
    }

    pub fn completed(&self) -> usize {
        CanvasKind::ALL.iter().filter(|k| self.has(**k)).count()
    }
}

/// Probe the four canvas collections concurrently.
pub async fn canvas_status(store: &dyn DocumentStore, project_id: &str) -> CoreResult<CanvasStatus> {
    let probe = |kind: CanvasKind| store.exists_where(kind.collection(), PROJECT_ID, project_id);
    let (business_model, value_proposition, value_stream, gap_analysis) = tokio::try_join!(
        probe(CanvasKind::BusinessModel),
        probe(CanvasKind::ValueProposition),
        probe(CanvasKind::ValueStream),
        probe(CanvasKind::GapAnalysis),
    )
    .or_backend("Could not check the project's canvases.")?;

    Ok(CanvasStatus {
        business_model,
        value_proposition,
        value_stream,
        gap_analysis,
    })
}

/// Parse a canvas kind from a URL or CLI argument.
pub fn parse_kind(s: &str) -> CoreResult<CanvasKind> {
    CanvasKind::from_slug(s).ok_or_else(|| {
        CoreError::validation(format!(
            "Unknown canvas '{}'. Expected one of: bmc, vpc, vsm, gap",
            s
        ))
    })
}

/// Trim every entry and drop blanks.
pub(crate) fn clean_list(items: &mut Vec<String>) {
    for item in items.iter_mut() {
        *item = item.trim().to_string();
    }
    items.retain(|i| !i.is_empty());
}

/// New identifier for a nested list item.
pub(crate) fn item_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrumkit_store::MemoryStore;

    #[tokio::test]
    async fn test_save_twice_updates_same_document() {
        let store = MemoryStore::new();
        let first = BusinessModelCanvas {
            key_partners: "Suppliers".into(),
            ..BusinessModelCanvas::default()
        };
        let saved = save_canvas(&store, "p1", &first).await.unwrap();

        let second = BusinessModelCanvas {
            key_partners: "Resellers".into(),
            ..saved.canvas.clone()
        };
        let resaved = save_canvas(&store, "p1", &second).await.unwrap();

        assert_eq!(resaved.id, saved.id);
        assert_eq!(resaved.created_at, saved.created_at);
        assert_eq!(resaved.canvas.key_partners, "Resellers");
        assert_eq!(store.count(BUSINESS_MODEL_CANVASES).await, 1);
    }

    #[tokio::test]
    async fn test_canvases_are_scoped_to_project() {
        let store = MemoryStore::new();
        save_canvas(&store, "p1", &ValuePropositionCanvas::default()).await.unwrap();
        assert!(get_canvas::<ValuePropositionCanvas>(&store, "p2").await.unwrap().is_none());
        let record = get_canvas::<ValuePropositionCanvas>(&store, "p1").await.unwrap().unwrap();
        assert_eq!(record.project_id, "p1");
    }

    #[tokio::test]
    async fn test_status_reflects_saved_kinds() {
        let store = MemoryStore::new();
        assert_eq!(canvas_status(&store, "p1").await.unwrap(), CanvasStatus::default());

        save_canvas(&store, "p1", &ValueStreamMap::default()).await.unwrap();
        save_canvas(&store, "p1", &GapAnalysis::default()).await.unwrap();
        let status = canvas_status(&store, "p1").await.unwrap();
        assert!(!status.business_model);
        assert!(status.value_stream);
        assert!(status.gap_analysis);
        assert_eq!(status.completed(), 2);

        assert!(delete_canvas(&store, CanvasKind::GapAnalysis, "p1").await.unwrap());
        assert!(!canvas_status(&store, "p1").await.unwrap().gap_analysis);
        assert!(!delete_canvas(&store, CanvasKind::GapAnalysis, "p1").await.unwrap());
    }

    #[test]
    fn test_kind_slugs() {
        for kind in CanvasKind::ALL {
            assert_eq!(CanvasKind::from_slug(kind.slug()), Some(kind));
            assert_eq!(serde_json::to_value(kind).unwrap(), kind.slug());
        }
        assert!(parse_kind("swot").is_err());
    }
}
