//! Epic route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use scrumkit_core::ListOptions;
use scrumkit_core::collections::EPICS;
use scrumkit_core::epic::{
    self,
    model::{Epic, EpicPatch, EpicProgress, NewEpic},
};
use scrumkit_store::ChangeEvent;

use super::owned_project;
use crate::error::{ApiResult, api_error, not_found};
use crate::extract::CurrentUser;
use crate::state::AppState;

pub async fn list_epics(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<String>,
    Query(options): Query<ListOptions>,
) -> ApiResult<Json<Vec<Epic>>> {
    owned_project(&state, &user, &project_id).await?;
    let epics = epic::list_epics(state.store.as_ref(), &project_id, &options)
        .await
        .map_err(api_error)?;
    Ok(Json(epics))
}

pub async fn create_epic(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<String>,
    Json(req): Json<NewEpic>,
) -> ApiResult<(StatusCode, Json<Epic>)> {
    req.validate().map_err(api_error)?;
    owned_project(&state, &user, &project_id).await?;
    let created = epic::create_epic(state.store.as_ref(), &project_id, &req)
        .await
        .map_err(api_error)?;
    state.broadcast(ChangeEvent::created(EPICS, &created.id));
    Ok((StatusCode::CREATED, Json(created)))
}

/// Load an epic whose project the user owns.
async fn owned_epic(state: &AppState, user: &CurrentUser, id: &str) -> ApiResult<Epic> {
    let found = epic::get_epic(state.store.as_ref(), id)
        .await
        .map_err(api_error)?
        .ok_or_else(|| not_found("Epic", id))?;
    owned_project(state, user, &found.project_id)
        .await
        .map_err(|_| not_found("Epic", id))?;
    Ok(found)
}

pub async fn get_epic(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Epic>> {
    Ok(Json(owned_epic(&state, &user, &id).await?))
}

pub async fn update_epic(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<EpicPatch>,
) -> ApiResult<Json<Epic>> {
    req.validate().map_err(api_error)?;
    owned_epic(&state, &user, &id).await?;
    let updated = epic::update_epic(state.store.as_ref(), &id, &req)
        .await
        .map_err(api_error)?;
    state.broadcast(ChangeEvent::updated(EPICS, &id));
    Ok(Json(updated))
}

pub async fn delete_epic(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    owned_epic(&state, &user, &id).await?;
    epic::delete_epic(state.store.as_ref(), &id).await.map_err(api_error)?;
    state.broadcast(ChangeEvent::deleted(EPICS, &id));
    Ok(StatusCode::NO_CONTENT)
}

pub async fn archive_epic(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Epic>> {
    owned_epic(&state, &user, &id).await?;
    let archived = epic::archive_epic(state.store.as_ref(), &id).await.map_err(api_error)?;
    state.broadcast(ChangeEvent::updated(EPICS, &id));
    Ok(Json(archived))
}

pub async fn restore_epic(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Epic>> {
    owned_epic(&state, &user, &id).await?;
    let restored = epic::restore_epic(state.store.as_ref(), &id).await.map_err(api_error)?;
    state.broadcast(ChangeEvent::updated(EPICS, &id));
    Ok(Json(restored))
}

pub async fn epic_progress(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<EpicProgress>> {
    owned_epic(&state, &user, &id).await?;
    let progress = epic::epic_progress(state.store.as_ref(), &id)
        .await
        .map_err(api_error)?;
    Ok(Json(progress))
}
