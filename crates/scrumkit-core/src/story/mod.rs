//! User stories.

pub mod model;

use scrumkit_store::{Direction, Document, DocumentStore, to_document};
use serde_json::{Value, json};
use tracing::info;

use crate::collections::{EPICS, SPRINTS, STORIES};
use crate::common::{ListOptions, decode_all};
use crate::error::{CoreError, CoreResult, StoreResultExt};
use model::{NewStory, Story, StoryPatch, StoryStatus, normalize_tags};

/// Default ordering for story listings.
const DEFAULT_SORT: (&str, Direction) = ("createdAt", Direction::Asc);

/// Create a story under an existing epic of the same project.
pub async fn create_story(
    store: &dyn DocumentStore,
    project_id: &str,
    input: &NewStory,
) -> CoreResult<Story> {
    ensure_in_project(store, EPICS, "Epic", &input.epic_id, project_id).await?;
    if let Some(sprint_id) = &input.sprint_id {
        ensure_in_project(store, SPRINTS, "Sprint", sprint_id, project_id).await?;
    }

    let body = to_document(&json!({
        "projectId": project_id,
        "epicId": input.epic_id,
        "sprintId": input.sprint_id,
        "title": input.title.trim(),
        "description": input.description.trim(),
        "storyPoints": input.story_points,
        "priority": input.priority,
        "status": input.status,
        "tags": normalize_tags(&input.tags),
        "acceptanceCriteria": clean_criteria(&input.acceptance_criteria),
        "assigneeId": Value::Null,
    }))
    .or_backend("Could not create the story.")?;

    let doc = store
        .add(STORIES, body)
        .await
        .or_backend("Could not create the story.")?;
    doc.decode().or_backend("Could not read the new story.")
}

pub async fn get_story(store: &dyn DocumentStore, id: &str) -> CoreResult<Option<Story>> {
    let doc = store
        .get(STORIES, id)
        .await
        .or_backend("Could not load the story.")?;
    doc.map(|d| d.decode())
        .transpose()
        .or_backend("Could not read the story.")
}

pub async fn update_story(store: &dyn DocumentStore, id: &str, patch: &StoryPatch) -> CoreResult<Story> {
    let mut patch = patch.clone();
    if let Some(tags) = &patch.tags {
        patch.tags = Some(normalize_tags(tags));
    }
    if let Some(criteria) = &patch.acceptance_criteria {
        patch.acceptance_criteria = Some(clean_criteria(criteria));
    }
    let body = to_document(&patch).or_backend("Could not update the story.")?;
    write_patch(store, id, body).await
}

pub async fn delete_story(store: &dyn DocumentStore, id: &str) -> CoreResult<bool> {
    store
        .delete(STORIES, id)
        .await
        .or_backend("Could not delete the story.")
}

/// Stories of a project through the read model.
pub async fn list_stories(
    store: &dyn DocumentStore,
    project_id: &str,
    options: &ListOptions,
) -> CoreResult<Vec<Story>> {
    let query = options.project_query(project_id, DEFAULT_SORT);
    let docs = store
        .query(STORIES, &query)
        .await
        .or_backend("Could not load the stories.")?;
    decode_all(docs).or_backend("Could not read the stories.")
}

/// Non-archived stories of an epic.
pub async fn list_stories_by_epic(store: &dyn DocumentStore, epic_id: &str) -> CoreResult<Vec<Story>> {
    let query = ListOptions::default().to_query("epicId", epic_id, DEFAULT_SORT);
    let docs = store
        .query(STORIES, &query)
        .await
        .or_backend("Could not load the epic's stories.")?;
    decode_all(docs).or_backend("Could not read the epic's stories.")
}

/// Non-archived stories committed to a sprint.
pub async fn list_stories_by_sprint(store: &dyn DocumentStore, sprint_id: &str) -> CoreResult<Vec<Story>> {
    let query = ListOptions::default().to_query("sprintId", sprint_id, DEFAULT_SORT);
    let docs = store
        .query(STORIES, &query)
        .await
        .or_backend("Could not load the sprint backlog.")?;
    decode_all(docs).or_backend("Could not read the sprint backlog.")
}

/// Commit a story to a sprint of the same project.
pub async fn assign_to_sprint(store: &dyn DocumentStore, story_id: &str, sprint_id: &str) -> CoreResult<Story> {
    let story = get_story(store, story_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Story", story_id))?;
    ensure_in_project(store, SPRINTS, "Sprint", sprint_id, &story.project_id).await?;

    let mut patch = Document::new();
    patch.insert("sprintId".into(), Value::String(sprint_id.to_string()));
    let updated = write_patch(store, story_id, patch).await?;
    info!(story_id, sprint_id, "Story assigned to sprint");
    Ok(updated)
}

/// Move a story back to the product backlog.
pub async fn remove_from_sprint(store: &dyn DocumentStore, story_id: &str) -> CoreResult<Story> {
    let mut patch = Document::new();
    patch.insert("sprintId".into(), Value::Null);
    write_patch(store, story_id, patch).await
}

pub async fn set_story_status(store: &dyn DocumentStore, id: &str, status: StoryStatus) -> CoreResult<Story> {
    let patch = StoryPatch {
        status: Some(status),
        ..StoryPatch::default()
    };
    update_story(store, id, &patch).await
}

/// Soft delete.
pub async fn archive_story(store: &dyn DocumentStore, id: &str) -> CoreResult<Story> {
    set_story_status(store, id, StoryStatus::Archived).await
}

/// Undo a soft delete; the story returns to the to-do column.
pub async fn restore_story(store: &dyn DocumentStore, id: &str) -> CoreResult<Story> {
    set_story_status(store, id, StoryStatus::Todo).await
}

async fn write_patch(store: &dyn DocumentStore, id: &str, body: Document) -> CoreResult<Story> {
    let doc = store
        .update(STORIES, id, body)
        .await
        .or_backend("Could not update the story.")?;
    doc.decode().or_backend("Could not read the story.")
}

/// Convention-only referential check: the parent exists in the same project.
async fn ensure_in_project(
    store: &dyn DocumentStore,
    collection: &str,
    entity: &str,
    id: &str,
    project_id: &str,
) -> CoreResult<()> {
    let parent = store
        .get(collection, id)
        .await
        .or_backend("Could not verify the story's parent.")?
        .ok_or_else(|| CoreError::validation(format!("{} {} does not exist", entity, id)))?;
    if parent.get_str("projectId") != Some(project_id) {
        return Err(CoreError::validation(format!(
            "{} {} belongs to another project",
            entity, id
        )));
    }
    Ok(())
}

fn clean_criteria(criteria: &[String]) -> Vec<String> {
    criteria
        .iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}
