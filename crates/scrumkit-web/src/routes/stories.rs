//! Story route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use scrumkit_core::ListOptions;
use scrumkit_core::collections::STORIES;
use scrumkit_core::story::{
    self,
    model::{NewStory, Story, StoryPatch, StoryStatus},
};
use scrumkit_store::ChangeEvent;

use super::owned_project;
use crate::error::{ApiResult, api_error, not_found};
use crate::extract::CurrentUser;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintAssignment {
    /// `null` moves the story back to the product backlog.
    pub sprint_id: Option<String>,
}

#[derive(Deserialize)]
pub struct StatusChange {
    pub status: StoryStatus,
}

pub async fn list_stories(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<String>,
    Query(options): Query<ListOptions>,
) -> ApiResult<Json<Vec<Story>>> {
    owned_project(&state, &user, &project_id).await?;
    let stories = story::list_stories(state.store.as_ref(), &project_id, &options)
        .await
        .map_err(api_error)?;
    Ok(Json(stories))
}

pub async fn create_story(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<String>,
    Json(req): Json<NewStory>,
) -> ApiResult<(StatusCode, Json<Story>)> {
    req.validate().map_err(api_error)?;
    owned_project(&state, &user, &project_id).await?;
    let created = story::create_story(state.store.as_ref(), &project_id, &req)
        .await
        .map_err(api_error)?;
    state.broadcast(ChangeEvent::created(STORIES, &created.id));
    Ok((StatusCode::CREATED, Json(created)))
}

async fn owned_story(state: &AppState, user: &CurrentUser, id: &str) -> ApiResult<Story> {
    let found = story::get_story(state.store.as_ref(), id)
        .await
        .map_err(api_error)?
        .ok_or_else(|| not_found("Story", id))?;
    owned_project(state, user, &found.project_id)
        .await
        .map_err(|_| not_found("Story", id))?;
    Ok(found)
}

pub async fn get_story(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Story>> {
    Ok(Json(owned_story(&state, &user, &id).await?))
}

pub async fn update_story(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<StoryPatch>,
) -> ApiResult<Json<Story>> {
    req.validate().map_err(api_error)?;
    owned_story(&state, &user, &id).await?;
    let updated = story::update_story(state.store.as_ref(), &id, &req)
        .await
        .map_err(api_error)?;
    state.broadcast(ChangeEvent::updated(STORIES, &id));
    Ok(Json(updated))
}

pub async fn delete_story(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    owned_story(&state, &user, &id).await?;
    story::delete_story(state.store.as_ref(), &id).await.map_err(api_error)?;
    state.broadcast(ChangeEvent::deleted(STORIES, &id));
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_sprint(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<SprintAssignment>,
) -> ApiResult<Json<Story>> {
    owned_story(&state, &user, &id).await?;
    let store = state.store.as_ref();
    let updated = match &req.sprint_id {
        Some(sprint_id) => story::assign_to_sprint(store, &id, sprint_id).await,
        None => story::remove_from_sprint(store, &id).await,
    }
    .map_err(api_error)?;
    state.broadcast(ChangeEvent::updated(STORIES, &id));
    Ok(Json(updated))
}

pub async fn set_status(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<StatusChange>,
) -> ApiResult<Json<Story>> {
    owned_story(&state, &user, &id).await?;
    let updated = story::set_story_status(state.store.as_ref(), &id, req.status)
        .await
        .map_err(api_error)?;
    state.broadcast(ChangeEvent::updated(STORIES, &id));
    Ok(Json(updated))
}
