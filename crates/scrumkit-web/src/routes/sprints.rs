//! Sprint route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use scrumkit_core::ListOptions;
use scrumkit_core::collections::SPRINTS;
use scrumkit_core::sprint::{
    self,
    model::{NewSprint, Sprint, SprintPatch, SprintSummary},
};
use scrumkit_store::ChangeEvent;

use super::owned_project;
use crate::error::{ApiResult, api_error, not_found};
use crate::extract::CurrentUser;
use crate::state::AppState;

pub async fn list_sprints(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<String>,
    Query(options): Query<ListOptions>,
) -> ApiResult<Json<Vec<Sprint>>> {
    owned_project(&state, &user, &project_id).await?;
    let sprints = sprint::list_sprints(state.store.as_ref(), &project_id, &options)
        .await
        .map_err(api_error)?;
    Ok(Json(sprints))
}

pub async fn create_sprint(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<String>,
    Json(req): Json<NewSprint>,
) -> ApiResult<(StatusCode, Json<Sprint>)> {
    req.validate().map_err(api_error)?;
    owned_project(&state, &user, &project_id).await?;
    let created = sprint::create_sprint(state.store.as_ref(), &project_id, &req)
        .await
        .map_err(api_error)?;
    state.broadcast(ChangeEvent::created(SPRINTS, &created.id));
    Ok((StatusCode::CREATED, Json(created)))
}

async fn owned_sprint(state: &AppState, user: &CurrentUser, id: &str) -> ApiResult<Sprint> {
    let found = sprint::get_sprint(state.store.as_ref(), id)
        .await
        .map_err(api_error)?
        .ok_or_else(|| not_found("Sprint", id))?;
    owned_project(state, user, &found.project_id)
        .await
        .map_err(|_| not_found("Sprint", id))?;
    Ok(found)
}

pub async fn get_sprint(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Sprint>> {
    Ok(Json(owned_sprint(&state, &user, &id).await?))
}

pub async fn update_sprint(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<SprintPatch>,
) -> ApiResult<Json<Sprint>> {
    req.validate().map_err(api_error)?;
    owned_sprint(&state, &user, &id).await?;
    let updated = sprint::update_sprint(state.store.as_ref(), &id, &req)
        .await
        .map_err(api_error)?;
    state.broadcast(ChangeEvent::updated(SPRINTS, &id));
    Ok(Json(updated))
}

pub async fn delete_sprint(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    owned_sprint(&state, &user, &id).await?;
    sprint::delete_sprint(state.store.as_ref(), &id).await.map_err(api_error)?;
    state.broadcast(ChangeEvent::deleted(SPRINTS, &id));
    Ok(StatusCode::NO_CONTENT)
}

pub async fn start_sprint(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Sprint>> {
    owned_sprint(&state, &user, &id).await?;
    let started = sprint::start_sprint(state.store.as_ref(), &id).await.map_err(api_error)?;
    state.broadcast(ChangeEvent::updated(SPRINTS, &id));
    Ok(Json(started))
}

pub async fn complete_sprint(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Sprint>> {
    owned_sprint(&state, &user, &id).await?;
    let completed = sprint::complete_sprint(state.store.as_ref(), &id)
        .await
        .map_err(api_error)?;
    state.broadcast(ChangeEvent::updated(SPRINTS, &id));
    Ok(Json(completed))
}

pub async fn sprint_summary(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<SprintSummary>> {
    owned_sprint(&state, &user, &id).await?;
    let summary = sprint::sprint_summary(state.store.as_ref(), &id)
        .await
        .map_err(api_error)?;
    Ok(Json(summary))
}
