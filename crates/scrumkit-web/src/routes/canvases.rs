//! Discovery canvas route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::Value;

use scrumkit_core::CoreError;
use scrumkit_core::canvas::{
    self, BusinessModelCanvas, Canvas, CanvasKind, CanvasStatus, GapAnalysis, ValuePropositionCanvas,
    ValueStreamMap, VsmMetrics,
};
use scrumkit_store::{ChangeEvent, DocumentStore};

use super::owned_project;
use crate::error::{ApiResult, api_error};
use crate::extract::CurrentUser;
use crate::state::AppState;

pub async fn canvas_status(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<String>,
) -> ApiResult<Json<CanvasStatus>> {
    owned_project(&state, &user, &project_id).await?;
    let status = canvas::canvas_status(state.store.as_ref(), &project_id)
        .await
        .map_err(api_error)?;
    Ok(Json(status))
}

/// The canvas as JSON, or `null` when the project has none yet.
pub async fn get_canvas(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((project_id, kind)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let kind = canvas::parse_kind(&kind).map_err(api_error)?;
    owned_project(&state, &user, &project_id).await?;
    let store = state.store.as_ref();
    let value = match kind {
        CanvasKind::BusinessModel => load_json::<BusinessModelCanvas>(store, &project_id).await,
        CanvasKind::ValueProposition => load_json::<ValuePropositionCanvas>(store, &project_id).await,
        CanvasKind::ValueStream => load_json::<ValueStreamMap>(store, &project_id).await,
        CanvasKind::GapAnalysis => load_json::<GapAnalysis>(store, &project_id).await,
    }
    .map_err(api_error)?;
    Ok(Json(value))
}

pub async fn save_canvas(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((project_id, kind)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let kind = canvas::parse_kind(&kind).map_err(api_error)?;
    owned_project(&state, &user, &project_id).await?;
    let store = state.store.as_ref();
    let (id, value) = match kind {
        CanvasKind::BusinessModel => save_json::<BusinessModelCanvas>(store, &project_id, body).await,
        CanvasKind::ValueProposition => save_json::<ValuePropositionCanvas>(store, &project_id, body).await,
        CanvasKind::ValueStream => save_json::<ValueStreamMap>(store, &project_id, body).await,
        CanvasKind::GapAnalysis => save_json::<GapAnalysis>(store, &project_id, body).await,
    }
    .map_err(api_error)?;
    state.broadcast(ChangeEvent::updated(kind.collection(), &id));
    Ok(Json(value))
}

pub async fn delete_canvas(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((project_id, kind)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let kind = canvas::parse_kind(&kind).map_err(api_error)?;
    owned_project(&state, &user, &project_id).await?;
    let removed = canvas::delete_canvas(state.store.as_ref(), kind, &project_id)
        .await
        .map_err(api_error)?;
    if removed {
        state.broadcast(ChangeEvent::Refresh);
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Flow metrics of the project's value stream map. A project without a
/// map gets all-zero metrics.
pub async fn vsm_metrics(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<String>,
) -> ApiResult<Json<VsmMetrics>> {
    owned_project(&state, &user, &project_id).await?;
    let map = canvas::get_canvas::<ValueStreamMap>(state.store.as_ref(), &project_id)
        .await
        .map_err(api_error)?
        .map(|record| record.canvas)
        .unwrap_or_default();
    Ok(Json(map.metrics()))
}

async fn load_json<T: Canvas>(store: &dyn DocumentStore, project_id: &str) -> Result<Value, CoreError> {
    let record = canvas::get_canvas::<T>(store, project_id).await?;
    Ok(serde_json::to_value(record)?)
}

async fn save_json<T: Canvas>(
    store: &dyn DocumentStore,
    project_id: &str,
    body: Value,
) -> Result<(String, Value), CoreError> {
    let data: T = serde_json::from_value(body)?;
    let record = canvas::save_canvas(store, project_id, &data).await?;
    Ok((record.id.clone(), serde_json::to_value(record)?))
}
