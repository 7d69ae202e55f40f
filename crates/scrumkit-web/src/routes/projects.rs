//! Project route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use scrumkit_core::collections::PROJECTS;
use scrumkit_core::project::{
    self,
    model::{NewProject, Project, ProjectPatch},
};
use scrumkit_store::ChangeEvent;

use super::owned_project;
use crate::error::{ApiResult, api_error};
use crate::extract::CurrentUser;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListProjectsParams {
    /// List archived projects instead of active ones.
    pub archived: bool,
}

pub async fn list_projects(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<ListProjectsParams>,
) -> ApiResult<Json<Vec<Project>>> {
    let store = state.store.as_ref();
    let projects = if params.archived {
        project::list_archived_projects(store, user.uid()).await
    } else {
        project::list_projects_for_user(store, user.uid()).await
    }
    .map_err(api_error)?;
    Ok(Json(projects))
}

pub async fn create_project(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<NewProject>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    req.validate().map_err(api_error)?;
    let created = project::create_project(state.store.as_ref(), &req, user.uid())
        .await
        .map_err(api_error)?;
    state.broadcast(ChangeEvent::created(PROJECTS, &created.id));
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_project(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Project>> {
    Ok(Json(owned_project(&state, &user, &id).await?))
}

pub async fn update_project(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<ProjectPatch>,
) -> ApiResult<Json<Project>> {
    req.validate().map_err(api_error)?;
    owned_project(&state, &user, &id).await?;
    let updated = project::update_project(state.store.as_ref(), &id, &req)
        .await
        .map_err(api_error)?;
    state.broadcast(ChangeEvent::updated(PROJECTS, &id));
    Ok(Json(updated))
}

pub async fn delete_project(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    owned_project(&state, &user, &id).await?;
    project::delete_project(state.store.as_ref(), &id)
        .await
        .map_err(api_error)?;
    state.broadcast(ChangeEvent::deleted(PROJECTS, &id));
    Ok(StatusCode::NO_CONTENT)
}

pub async fn archive_project(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Project>> {
    owned_project(&state, &user, &id).await?;
    let archived = project::archive_project(state.store.as_ref(), &id)
        .await
        .map_err(api_error)?;
    state.broadcast(ChangeEvent::updated(PROJECTS, &id));
    Ok(Json(archived))
}

pub async fn restore_project(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Project>> {
    owned_project(&state, &user, &id).await?;
    let restored = project::restore_project(state.store.as_ref(), &id)
        .await
        .map_err(api_error)?;
    state.broadcast(ChangeEvent::updated(PROJECTS, &id));
    Ok(Json(restored))
}
