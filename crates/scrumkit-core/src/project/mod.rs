//! Project directory.

pub mod model;

use scrumkit_store::{Direction, DocumentStore, Query, to_document};
use serde_json::json;
use tracing::info;

use crate::collections::PROJECTS;
use crate::common::decode_all;
use crate::error::{CoreError, CoreResult, StoreResultExt};
use model::{NewProject, Project, ProjectPatch, ProjectStatus};

/// Create a project owned by `owner_id`.
pub async fn create_project(
    store: &dyn DocumentStore,
    input: &NewProject,
    owner_id: &str,
) -> CoreResult<Project> {
    let body = to_document(&json!({
        "name": input.name.trim(),
        "description": input.description.trim(),
        "status": ProjectStatus::Active,
        "ownerId": owner_id,
    }))
    .or_backend("Could not create the project.")?;

    let doc = store
        .add(PROJECTS, body)
        .await
        .or_backend("Could not create the project.")?;
    info!(project_id = %doc.id, owner_id, "Project created");
    doc.decode().or_backend("Could not read the new project.")
}

/// Get a project by ID.
pub async fn get_project(store: &dyn DocumentStore, id: &str) -> CoreResult<Option<Project>> {
    let doc = store
        .get(PROJECTS, id)
        .await
        .or_backend("Could not load the project.")?;
    doc.map(|d| d.decode())
        .transpose()
        .or_backend("Could not read the project.")
}

/// Get a project by ID, failing when it does not exist.
pub async fn require_project(store: &dyn DocumentStore, id: &str) -> CoreResult<Project> {
    get_project(store, id)
        .await?
        .ok_or_else(|| CoreError::not_found("Project", id))
}

/// Apply a partial update.
pub async fn update_project(
    store: &dyn DocumentStore,
    id: &str,
    patch: &ProjectPatch,
) -> CoreResult<Project> {
    let body = to_document(patch).or_backend("Could not update the project.")?;
    let doc = store
        .update(PROJECTS, id, body)
        .await
        .or_backend("Could not update the project.")?;
    doc.decode().or_backend("Could not read the project.")
}

/// Hard delete. Epics, stories, sprints and canvases of the project are
/// left in place.
pub async fn delete_project(store: &dyn DocumentStore, id: &str) -> CoreResult<bool> {
    let removed = store
        .delete(PROJECTS, id)
        .await
        .or_backend("Could not delete the project.")?;
    if removed {
        info!(project_id = id, "Project deleted");
    }
    Ok(removed)
}

/// Active projects of a user, most recently updated first.
///
/// The store is queried on `ownerId` alone; archived projects are dropped
/// and the result sorted in memory.
pub async fn list_projects_for_user(
    store: &dyn DocumentStore,
    owner_id: &str,
) -> CoreResult<Vec<Project>> {
    let query = Query::new()
        .where_eq("ownerId", owner_id)
        .where_ne("status", ProjectStatus::Archived.as_str())
        .order_by("updatedAt", Direction::Desc);
    let docs = store
        .query(PROJECTS, &query)
        .await
        .or_backend("Could not load your projects.")?;
    decode_all(docs).or_backend("Could not read your projects.")
}

/// Archived projects of a user, most recently updated first.
pub async fn list_archived_projects(
    store: &dyn DocumentStore,
    owner_id: &str,
) -> CoreResult<Vec<Project>> {
    let query = Query::new()
        .where_eq("ownerId", owner_id)
        .where_eq("status", ProjectStatus::Archived.as_str())
        .order_by("updatedAt", Direction::Desc);
    let docs = store
        .query(PROJECTS, &query)
        .await
        .or_backend("Could not load archived projects.")?;
    decode_all(docs).or_backend("Could not read archived projects.")
}

/// Soft delete.
pub async fn archive_project(store: &dyn DocumentStore, id: &str) -> CoreResult<Project> {
    set_status(store, id, ProjectStatus::Archived).await
}

/// Undo a soft delete.
pub async fn restore_project(store: &dyn DocumentStore, id: &str) -> CoreResult<Project> {
    set_status(store, id, ProjectStatus::Active).await
}

async fn set_status(store: &dyn DocumentStore, id: &str, status: ProjectStatus) -> CoreResult<Project> {
    let patch = ProjectPatch {
        status: Some(status),
        ..ProjectPatch::default()
    };
    update_project(store, id, &patch).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrumkit_store::MemoryStore;

    #[tokio::test]
    async fn test_create_and_get() {
        let store = MemoryStore::new();
        let project = create_project(&store, &NewProject::new("  Apollo ", "Moonshot"), "u1")
            .await
            .unwrap();
        assert!(!project.id.is_empty());
        assert_eq!(project.name, "Apollo");
        assert_eq!(project.status, ProjectStatus::Active);
        assert_eq!(project.created_at, project.updated_at);

        let fetched = get_project(&store, &project.id).await.unwrap().unwrap();
        assert_eq!(fetched, project);
        assert!(get_project(&store, "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_excludes_archived_and_other_owners() {
        let store = MemoryStore::new();
        let a = create_project(&store, &NewProject::new("A", ""), "u1").await.unwrap();
        let b = create_project(&store, &NewProject::new("B", ""), "u1").await.unwrap();
        create_project(&store, &NewProject::new("C", ""), "u2").await.unwrap();
        archive_project(&store, &a.id).await.unwrap();

        let active = list_projects_for_user(&store, "u1").await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, b.id);

        let archived = list_archived_projects(&store, "u1").await.unwrap();
        assert_eq!(archived.len(), 1);
        assert_eq!(archived[0].id, a.id);
    }

    #[tokio::test]
    async fn test_update_missing_project_is_not_found() {
        let store = MemoryStore::new();
        let patch = ProjectPatch {
            name: Some("X".into()),
            ..ProjectPatch::default()
        };
        let err = update_project(&store, "ghost", &patch).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn test_validation() {
        assert!(NewProject::new("   ", "d").validate().is_err());
        assert!(NewProject::new("Ok", "").validate().is_ok());
        let patch = ProjectPatch {
            name: Some(String::new()),
            ..ProjectPatch::default()
        };
        assert!(patch.validate().is_err());
    }
}
