//! Sprints.

pub mod model;

use scrumkit_store::{Direction, Document, DocumentStore, to_document};
use serde_json::json;
use tracing::info;

use crate::collections::SPRINTS;
use crate::common::{ListOptions, decode_all};
use crate::error::{CoreError, CoreResult, StoreResultExt};
use crate::story::{self, model::Story};
use model::{NewSprint, Sprint, SprintPatch, SprintStatus, SprintSummary};

pub async fn create_sprint(store: &dyn DocumentStore, project_id: &str, input: &NewSprint) -> CoreResult<Sprint> {
    let body = to_document(&json!({
        "projectId": project_id,
        "name": input.name.trim(),
        "goal": input.goal.trim(),
        "startDate": input.start_date,
        "endDate": input.end_date,
        "status": SprintStatus::Planned,
        "capacity": input.capacity,
        "velocity": null,
    }))
    .or_backend("Could not create the sprint.")?;

    let doc = store
        .add(SPRINTS, body)
        .await
        .or_backend("Could not create the sprint.")?;
    doc.decode().or_backend("Could not read the new sprint.")
}

pub async fn get_sprint(store: &dyn DocumentStore, id: &str) -> CoreResult<Option<Sprint>> {
    let doc = store
        .get(SPRINTS, id)
        .await
        .or_backend("Could not load the sprint.")?;
    doc.map(|d| d.decode())
        .transpose()
        .or_backend("Could not read the sprint.")
}

async fn require_sprint(store: &dyn DocumentStore, id: &str) -> CoreResult<Sprint> {
    get_sprint(store, id)
        .await?
        .ok_or_else(|| CoreError::not_found("Sprint", id))
}

/// Apply `patch`. A change to either date is checked against the stored
/// other date.
pub async fn update_sprint(store: &dyn DocumentStore, id: &str, patch: &SprintPatch) -> CoreResult<Sprint> {
    if patch.touches_dates() {
        let current = require_sprint(store, id).await?;
        patch.validate_against(&current)?;
    }
    let body = to_document(patch).or_backend("Could not update the sprint.")?;
    write_sprint(store, id, body).await
}

async fn set_lifecycle(
    store: &dyn DocumentStore,
    id: &str,
    status: SprintStatus,
    velocity: Option<u32>,
) -> CoreResult<Sprint> {
    let mut body = json!({ "status": status });
    if let Some(velocity) = velocity {
        body["velocity"] = json!(velocity);
    }
    let body = to_document(&body).or_backend("Could not update the sprint.")?;
    write_sprint(store, id, body).await
}

async fn write_sprint(store: &dyn DocumentStore, id: &str, body: Document) -> CoreResult<Sprint> {
    let doc = store
        .update(SPRINTS, id, body)
        .await
        .or_backend("Could not update the sprint.")?;
    doc.decode().or_backend("Could not read the sprint.")
}

/// Hard delete. Stories keep their `sprintId`.
pub async fn delete_sprint(store: &dyn DocumentStore, id: &str) -> CoreResult<bool> {
    store
        .delete(SPRINTS, id)
        .await
        .or_backend("Could not delete the sprint.")
}

/// Sprints of a project, in calendar order unless another sort is given.
pub async fn list_sprints(
    store: &dyn DocumentStore,
    project_id: &str,
    options: &ListOptions,
) -> CoreResult<Vec<Sprint>> {
    let query = options.project_query(project_id, ("startDate", Direction::Asc));
    let docs = store
        .query(SPRINTS, &query)
        .await
        .or_backend("Could not load the sprints.")?;
    decode_all(docs).or_backend("Could not read the sprints.")
}

/// Mark a planned sprint as running.
pub async fn start_sprint(store: &dyn DocumentStore, id: &str) -> CoreResult<Sprint> {
    let sprint = require_sprint(store, id).await?;
    if sprint.status == SprintStatus::Completed {
        return Err(CoreError::validation(format!(
            "Sprint '{}' is already completed",
            sprint.name
        )));
    }
    let started = set_lifecycle(store, id, SprintStatus::Active, None).await?;
    info!(sprint_id = id, "Sprint started");
    Ok(started)
}

/// Close a sprint and record its velocity from the stories that were done.
pub async fn complete_sprint(store: &dyn DocumentStore, id: &str) -> CoreResult<Sprint> {
    require_sprint(store, id).await?;
    let stories = story::list_stories_by_sprint(store, id).await?;
    let velocity = done_points(&stories);
    let completed = set_lifecycle(store, id, SprintStatus::Completed, Some(velocity)).await?;
    info!(sprint_id = id, velocity, "Sprint completed");
    Ok(completed)
}

pub async fn sprint_summary(store: &dyn DocumentStore, id: &str) -> CoreResult<SprintSummary> {
    let sprint = require_sprint(store, id).await?;
    let stories = story::list_stories_by_sprint(store, id).await?;
    Ok(SprintSummary {
        sprint_id: sprint.id,
        story_count: stories.len(),
        done_count: stories.iter().filter(|s| s.is_done()).count(),
        committed_points: stories.iter().map(Story::points).sum(),
        completed_points: done_points(&stories),
        capacity: sprint.capacity,
    })
}

fn done_points(stories: &[Story]) -> u32 {
    stories.iter().filter(|s| s.is_done()).map(Story::points).sum()
}
