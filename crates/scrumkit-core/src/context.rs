//! The signed-in user's project list and current selection.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use scrumkit_store::SharedStore;

use crate::error::{CoreError, CoreResult};
use crate::project::{list_projects_for_user, model::Project};

/// Local state file holding the last selected project.
#[derive(Debug, Clone)]
pub struct SelectionStore {
    path: PathBuf,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectionState {
    #[serde(default)]
    current_project_id: Option<String>,
}

impl SelectionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.scrumkit/state.json`.
    pub fn default_location() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Config("Could not determine the home directory".into()))?;
        Ok(Self::new(home.join(".scrumkit").join("state.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored project id. A missing or unreadable file counts as no
    /// selection.
    pub fn load(&self) -> Option<String> {
        let content = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str::<SelectionState>(&content) {
            Ok(state) => state.current_project_id,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring unreadable selection state");
                None
            }
        }
    }

    pub fn save(&self, project_id: Option<&str>) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let state = SelectionState {
            current_project_id: project_id.map(str::to_string),
        };
        fs::write(&self.path, serde_json::to_string_pretty(&state)?)?;
        Ok(())
    }
}

/// Projects visible to one user, plus which one is being worked on.
pub struct ProjectContext {
    store: SharedStore,
    owner_id: String,
    selection: SelectionStore,
    projects: Vec<Project>,
    current: Option<String>,
}

impl ProjectContext {
    /// Load the user's projects and restore the last selection, falling
    /// back to the first project when it is gone.
    pub async fn load(
        store: SharedStore,
        owner_id: impl Into<String>,
        selection: SelectionStore,
    ) -> CoreResult<Self> {
        let mut ctx = Self {
            store,
            owner_id: owner_id.into(),
            current: selection.load(),
            selection,
            projects: Vec::new(),
        };
        ctx.refresh().await?;
        Ok(ctx)
    }

    /// Reload the project list, keeping the selection when still valid.
    pub async fn refresh(&mut self) -> CoreResult<()> {
        self.projects = list_projects_for_user(self.store.as_ref(), &self.owner_id).await?;
        let still_there = self
            .current
            .as_deref()
            .is_some_and(|id| self.projects.iter().any(|p| p.id == id));
        if !still_there {
            let fallback = self.projects.first().map(|p| p.id.clone());
            if self.current.is_some() {
                debug!(stale = ?self.current, fallback = ?fallback, "Selected project no longer available");
            }
            self.current = fallback;
        }
        Ok(())
    }

    /// Make `project_id` current and remember it.
    pub fn select(&mut self, project_id: &str) -> CoreResult<&Project> {
        let index = self
            .projects
            .iter()
            .position(|p| p.id == project_id)
            .ok_or_else(|| CoreError::not_found("Project", project_id))?;
        self.selection.save(Some(project_id))?;
        self.current = Some(project_id.to_string());
        Ok(&self.projects[index])
    }

    pub fn current(&self) -> Option<&Project> {
        let id = self.current.as_deref()?;
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{archive_project, create_project, model::NewProject};
    use scrumkit_store::MemoryStore;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_restores_saved_selection() {
        let dir = TempDir::new().unwrap();
        let store: SharedStore = Arc::new(MemoryStore::new());
        create_project(store.as_ref(), &NewProject::new("A", ""), "u1").await.unwrap();
        let b = create_project(store.as_ref(), &NewProject::new("B", ""), "u1").await.unwrap();

        let selection = SelectionStore::new(dir.path().join("state.json"));
        let mut ctx = ProjectContext::load(store.clone(), "u1", selection.clone()).await.unwrap();
        assert_eq!(ctx.projects().len(), 2);
        ctx.select(&b.id).unwrap();

        let reloaded = ProjectContext::load(store, "u1", selection).await.unwrap();
        assert_eq!(reloaded.current().unwrap().id, b.id);
    }

    #[tokio::test]
    async fn test_stale_selection_falls_back_to_first() {
        let dir = TempDir::new().unwrap();
        let store: SharedStore = Arc::new(MemoryStore::new());
        let a = create_project(store.as_ref(), &NewProject::new("A", ""), "u1").await.unwrap();

        let selection = SelectionStore::new(dir.path().join("nested").join("state.json"));
        selection.save(Some("deleted-project")).unwrap();

        let ctx = ProjectContext::load(store.clone(), "u1", selection).await.unwrap();
        assert_eq!(ctx.current().unwrap().id, a.id);

        archive_project(store.as_ref(), &a.id).await.unwrap();
        let mut ctx = ctx;
        ctx.refresh().await.unwrap();
        assert!(ctx.current().is_none());
        assert!(ctx.projects().is_empty());
    }

    #[tokio::test]
    async fn test_select_unknown_project_fails() {
        let dir = TempDir::new().unwrap();
        let store: SharedStore = Arc::new(MemoryStore::new());
        let selection = SelectionStore::new(dir.path().join("state.json"));
        let mut ctx = ProjectContext::load(store, "u1", selection.clone()).await.unwrap();
        assert!(matches!(ctx.select("nope").unwrap_err(), CoreError::NotFound(_)));
        assert!(selection.load().is_none());
    }

    #[test]
    fn test_state_file_format() {
        let dir = TempDir::new().unwrap();
        let selection = SelectionStore::new(dir.path().join("state.json"));
        selection.save(Some("p1")).unwrap();
        let raw = fs::read_to_string(selection.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["currentProjectId"], "p1");
    }
}
