//! Team member route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use scrumkit_core::ListOptions;
use scrumkit_core::collections::TEAM_MEMBERS;
use scrumkit_core::team::{
    self,
    model::{NewTeamMember, TeamMember, TeamMemberPatch},
};
use scrumkit_store::ChangeEvent;

use super::owned_project;
use crate::error::{ApiResult, api_error, not_found};
use crate::extract::CurrentUser;
use crate::state::AppState;

pub async fn list_members(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<String>,
    Query(options): Query<ListOptions>,
) -> ApiResult<Json<Vec<TeamMember>>> {
    owned_project(&state, &user, &project_id).await?;
    let members = team::list_members(state.store.as_ref(), &project_id, &options)
        .await
        .map_err(api_error)?;
    Ok(Json(members))
}

pub async fn add_member(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<String>,
    Json(req): Json<NewTeamMember>,
) -> ApiResult<(StatusCode, Json<TeamMember>)> {
    req.validate().map_err(api_error)?;
    owned_project(&state, &user, &project_id).await?;
    let created = team::add_member(state.store.as_ref(), &project_id, &req)
        .await
        .map_err(api_error)?;
    state.broadcast(ChangeEvent::created(TEAM_MEMBERS, &created.id));
    Ok((StatusCode::CREATED, Json(created)))
}

async fn owned_member(state: &AppState, user: &CurrentUser, id: &str) -> ApiResult<TeamMember> {
    let found = team::get_member(state.store.as_ref(), id)
        .await
        .map_err(api_error)?
        .ok_or_else(|| not_found("Team member", id))?;
    owned_project(state, user, &found.project_id)
        .await
        .map_err(|_| not_found("Team member", id))?;
    Ok(found)
}

pub async fn update_member(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<TeamMemberPatch>,
) -> ApiResult<Json<TeamMember>> {
    req.validate().map_err(api_error)?;
    owned_member(&state, &user, &id).await?;
    let updated = team::update_member(state.store.as_ref(), &id, &req)
        .await
        .map_err(api_error)?;
    state.broadcast(ChangeEvent::updated(TEAM_MEMBERS, &id));
    Ok(Json(updated))
}

pub async fn remove_member(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    owned_member(&state, &user, &id).await?;
    team::remove_member(state.store.as_ref(), &id).await.map_err(api_error)?;
    state.broadcast(ChangeEvent::deleted(TEAM_MEMBERS, &id));
    Ok(StatusCode::NO_CONTENT)
}
