//! Route handlers.

pub mod auth;
pub mod canvases;
pub mod epics;
pub mod projects;
pub mod sprints;
pub mod stories;
pub mod team;

use scrumkit_core::project::{self, model::Project};

use crate::error::{ApiResult, api_error, not_found};
use crate::extract::CurrentUser;
use crate::state::AppState;

/// Load a project the current user owns. Other users' projects are
/// reported as missing.
pub(crate) async fn owned_project(state: &AppState, user: &CurrentUser, project_id: &str) -> ApiResult<Project> {
    let project = project::get_project(state.store.as_ref(), project_id)
        .await
        .map_err(api_error)?
        .filter(|p| p.owner_id == user.uid())
        .ok_or_else(|| not_found("Project", project_id))?;
    Ok(project)
}
