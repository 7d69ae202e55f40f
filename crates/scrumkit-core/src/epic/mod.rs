//! Epics.

pub mod model;

use scrumkit_store::{Direction, DocumentStore, to_document};
use serde_json::json;
use tracing::info;

use crate::collections::{EPICS, STORIES};
use crate::common::{ListOptions, decode_all};
use crate::error::{CoreError, CoreResult, StoreResultExt};
use crate::saga::Saga;
use crate::story::{self, model::{NewStory, Story}};
use model::{EPIC_COLORS, Epic, EpicPatch, EpicProgress, EpicStatus, NewEpic};

pub async fn create_epic(store: &dyn DocumentStore, project_id: &str, input: &NewEpic) -> CoreResult<Epic> {
    let color = match &input.color {
        Some(c) if !c.trim().is_empty() => c.trim().to_string(),
        _ => next_color(store, project_id).await?,
    };

    let body = to_document(&json!({
        "projectId": project_id,
        "title": input.title.trim(),
        "description": input.description.trim(),
        "businessValue": input.business_value,
        "effort": input.effort,
        "priority": input.priority,
        "status": EpicStatus::Backlog,
        "color": color,
    }))
    .or_backend("Could not create the epic.")?;

    let doc = store
        .add(EPICS, body)
        .await
        .or_backend("Could not create the epic.")?;
    doc.decode().or_backend("Could not read the new epic.")
}

pub async fn get_epic(store: &dyn DocumentStore, id: &str) -> CoreResult<Option<Epic>> {
    let doc = store
        .get(EPICS, id)
        .await
        .or_backend("Could not load the epic.")?;
    doc.map(|d| d.decode())
        .transpose()
        .or_backend("Could not read the epic.")
}

pub async fn update_epic(store: &dyn DocumentStore, id: &str, patch: &EpicPatch) -> CoreResult<Epic> {
    let body = to_document(patch).or_backend("Could not update the epic.")?;
    let doc = store
        .update(EPICS, id, body)
        .await
        .or_backend("Could not update the epic.")?;
    doc.decode().or_backend("Could not read the epic.")
}

/// Hard delete. Stories of the epic are not removed.
pub async fn delete_epic(store: &dyn DocumentStore, id: &str) -> CoreResult<bool> {
    store
        .delete(EPICS, id)
        .await
        .or_backend("Could not delete the epic.")
}

/// Epics of a project through the read model; oldest first by default.
pub async fn list_epics(
    store: &dyn DocumentStore,
    project_id: &str,
    options: &ListOptions,
) -> CoreResult<Vec<Epic>> {
    let query = options.project_query(project_id, ("createdAt", Direction::Asc));
    let docs = store
        .query(EPICS, &query)
        .await
        .or_backend("Could not load the epics.")?;
    decode_all(docs).or_backend("Could not read the epics.")
}

/// Soft delete.
pub async fn archive_epic(store: &dyn DocumentStore, id: &str) -> CoreResult<Epic> {
    set_status(store, id, EpicStatus::Archived).await
}

/// Undo a soft delete; the epic returns to the backlog.
pub async fn restore_epic(store: &dyn DocumentStore, id: &str) -> CoreResult<Epic> {
    set_status(store, id, EpicStatus::Backlog).await
}

async fn set_status(store: &dyn DocumentStore, id: &str, status: EpicStatus) -> CoreResult<Epic> {
    let patch = EpicPatch {
        status: Some(status),
        ..EpicPatch::default()
    };
    update_epic(store, id, &patch).await
}

/// Story and point totals for an epic.
pub async fn epic_progress(store: &dyn DocumentStore, epic_id: &str) -> CoreResult<EpicProgress> {
    if get_epic(store, epic_id).await?.is_none() {
        return Err(CoreError::not_found("Epic", epic_id));
    }
    let stories = story::list_stories_by_epic(store, epic_id).await?;
    Ok(progress_from_stories(epic_id, &stories))
}

pub(crate) fn progress_from_stories(epic_id: &str, stories: &[Story]) -> EpicProgress {
    let points_total: u32 = stories.iter().map(Story::points).sum();
    let points_done: u32 = stories.iter().filter(|s| s.is_done()).map(Story::points).sum();
    let percent_complete = if points_total == 0 {
        0.0
    } else {
        f64::from(points_done) / f64::from(points_total) * 100.0
    };
    EpicProgress {
        epic_id: epic_id.to_string(),
        story_count: stories.len(),
        done_count: stories.iter().filter(|s| s.is_done()).count(),
        points_total,
        points_done,
        percent_complete,
    }
}

/// Create an epic together with its initial stories.
///
/// Either everything is created, or whatever was created is removed again
/// before the error is returned.
pub async fn create_epic_with_stories(
    store: &dyn DocumentStore,
    project_id: &str,
    epic: &NewEpic,
    stories: &[NewStory],
) -> CoreResult<(Epic, Vec<Story>)> {
    let mut saga = Saga::new(store, format!("epic '{}'", epic.title));
    match create_epic_steps(store, &mut saga, project_id, epic, stories).await {
        Ok(created) => {
            saga.commit();
            info!(epic_id = %created.0.id, stories = created.1.len(), "Epic created with stories");
            Ok(created)
        }
        Err(e) => {
            saga.compensate().await;
            Err(e)
        }
    }
}

async fn create_epic_steps(
    store: &dyn DocumentStore,
    saga: &mut Saga<'_>,
    project_id: &str,
    epic: &NewEpic,
    stories: &[NewStory],
) -> CoreResult<(Epic, Vec<Story>)> {
    let created_epic = create_epic(store, project_id, epic).await?;
    saga.record(EPICS, &created_epic.id);

    let mut created_stories = Vec::with_capacity(stories.len());
    for input in stories {
        let input = NewStory {
            epic_id: created_epic.id.clone(),
            ..input.clone()
        };
        let story = story::create_story(store, project_id, &input).await?;
        saga.record(STORIES, &story.id);
        created_stories.push(story);
    }
    Ok((created_epic, created_stories))
}

/// Pick the first palette color not yet used by the project's epics.
async fn next_color(store: &dyn DocumentStore, project_id: &str) -> CoreResult<String> {
    let all = ListOptions {
        include_archived: true,
        ..ListOptions::default()
    };
    let epics = list_epics(store, project_id, &all).await?;
    let color = EPIC_COLORS
        .iter()
        .find(|c| !epics.iter().any(|e| e.color == **c))
        .unwrap_or(&EPIC_COLORS[epics.len() % EPIC_COLORS.len()]);
    Ok(color.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::story::model::StoryStatus;
    use scrumkit_store::MemoryStore;

    #[tokio::test]
    async fn test_colors_assigned_from_palette() {
        let store = MemoryStore::new();
        let a = create_epic(&store, "p1", &NewEpic::new("A")).await.unwrap();
        let b = create_epic(&store, "p1", &NewEpic::new("B")).await.unwrap();
        let custom = NewEpic {
            color: Some("#000000".into()),
            ..NewEpic::new("C")
        };
        let c = create_epic(&store, "p1", &custom).await.unwrap();
        assert_eq!(a.color, EPIC_COLORS[0]);
        assert_eq!(b.color, EPIC_COLORS[1]);
        assert_eq!(c.color, "#000000");
    }

    #[tokio::test]
    async fn test_progress_counts_done_points() {
        let store = MemoryStore::new();
        let epic = create_epic(&store, "p1", &NewEpic::new("Checkout")).await.unwrap();
        let s1 = story::create_story(&store, "p1", &NewStory::new(&epic.id, "Cart").with_points(5))
            .await
            .unwrap();
        story::create_story(&store, "p1", &NewStory::new(&epic.id, "Pay").with_points(3))
            .await
            .unwrap();
        story::set_story_status(&store, &s1.id, StoryStatus::Done).await.unwrap();

        let progress = epic_progress(&store, &epic.id).await.unwrap();
        assert_eq!(progress.story_count, 2);
        assert_eq!(progress.done_count, 1);
        assert_eq!(progress.points_total, 8);
        assert_eq!(progress.points_done, 5);
        assert!((progress.percent_complete - 62.5).abs() < f64::EPSILON);

        assert!(matches!(
            epic_progress(&store, "missing").await.unwrap_err(),
            CoreError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_create_with_stories_rolls_back_on_failure() {
        let store = MemoryStore::new();
        let stories = vec![
            NewStory::new("", "Valid"),
            // Unknown sprint aborts the second step.
            NewStory {
                sprint_id: Some("no-such-sprint".into()),
                ..NewStory::new("", "Broken")
            },
        ];
        let err = create_epic_with_stories(&store, "p1", &NewEpic::new("E"), &stories)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(store.total_documents().await, 0);
    }

    #[tokio::test]
    async fn test_create_with_stories_links_children() {
        let store = MemoryStore::new();
        let stories = vec![NewStory::new("", "One"), NewStory::new("", "Two")];
        let (epic, created) = create_epic_with_stories(&store, "p1", &NewEpic::new("E"), &stories)
            .await
            .unwrap();
        assert_eq!(created.len(), 2);
        assert!(created.iter().all(|s| s.epic_id == epic.id));
    }

    #[tokio::test]
    async fn test_value_ratio_and_validation() {
        let store = MemoryStore::new();
        let input = NewEpic {
            business_value: 8,
            effort: 2,
            ..NewEpic::new("Quick win")
        };
        let epic = create_epic(&store, "p1", &input).await.unwrap();
        assert!((epic.value_ratio() - 4.0).abs() < f64::EPSILON);

        assert!(NewEpic {
            business_value: 11,
            ..NewEpic::new("X")
        }
        .validate()
        .is_err());
        assert!(NewEpic::new("X").validate().is_ok());
    }
}
