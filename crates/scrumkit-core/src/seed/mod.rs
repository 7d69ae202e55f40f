//! Demo data seeding.
//!
//! Each demo project is written inside its own [`Saga`]: a failure rolls
//! back that project only and the remaining projects are still seeded.

pub mod data;

use chrono::Utc;
use tracing::{error, info};

use scrumkit_store::DocumentStore;

use crate::canvas::{self, Canvas};
use crate::collections::{EPICS, PROJECTS, SPRINTS, STORIES, TEAM_MEMBERS};
use crate::config::BackendConfig;
use crate::epic;
use crate::error::{CoreError, CoreResult};
use crate::project::{self, model::Project};
use crate::saga::Saga;
use crate::sprint::{self, model::SprintStatus};
use crate::story::{self, model::NewStory};
use crate::team;
pub use data::{DemoCanvases, DemoProject, demo_canvases, demo_projects};

/// Progress callbacks for a seeding run.
pub trait SeedReporter: Send + Sync {
    fn project_started(&self, _name: &str) {}
    fn step(&self, _description: &str) {}
    fn project_finished(&self, _name: &str, _documents: usize) {}
    fn project_failed(&self, _name: &str, _error: &CoreError) {}
}

/// Reporter that prints nothing.
pub struct SilentReporter;

impl SeedReporter for SilentReporter {}

/// Outcome of a seeding run.
#[derive(Debug, Default)]
pub struct SeedReport {
    pub projects: Vec<Project>,
    /// Project name and error message for each rolled-back project.
    pub failures: Vec<(String, String)>,
    pub documents: usize,
}

impl SeedReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Seed the demo projects for `owner_id`.
pub async fn run(store: &dyn DocumentStore, owner_id: &str, reporter: &dyn SeedReporter) -> SeedReport {
    let today = Utc::now().date_naive();
    let mut report = SeedReport::default();

    for (index, demo) in demo_projects(today).iter().enumerate() {
        let name = demo.project.name.clone();
        reporter.project_started(&name);

        let canvases = (index == 0).then(demo_canvases);
        let mut saga = Saga::new(store, format!("seed '{}'", name));
        match seed_project(store, &mut saga, owner_id, demo, canvases.as_ref(), reporter).await {
            Ok(project) => {
                let documents = saga.commit();
                info!(project_id = %project.id, documents, "Seeded demo project");
                reporter.project_finished(&name, documents);
                report.documents += documents;
                report.projects.push(project);
            }
            Err(e) => {
                error!(project = %name, error = %e, "Seeding failed, rolling back");
                reporter.project_failed(&name, &e);
                saga.compensate().await;
                report.failures.push((name, e.to_string()));
            }
        }
    }
    report
}

/// Validate the backend configuration, then seed. Nothing is written when
/// configuration is missing.
pub async fn run_with_env(
    store: &dyn DocumentStore,
    lookup: impl Fn(&str) -> Option<String>,
    owner_id: &str,
    reporter: &dyn SeedReporter,
) -> CoreResult<SeedReport> {
    let config = BackendConfig::from_lookup(lookup)?;
    info!(namespace = config.store_namespace(), "Configuration valid");
    Ok(run(store, owner_id, reporter).await)
}

async fn seed_project(
    store: &dyn DocumentStore,
    saga: &mut Saga<'_>,
    owner_id: &str,
    demo: &DemoProject,
    canvases: Option<&DemoCanvases>,
    reporter: &dyn SeedReporter,
) -> CoreResult<Project> {
    let project = project::create_project(store, &demo.project, owner_id).await?;
    saga.record(PROJECTS, &project.id);

    reporter.step(&format!("{} team members", demo.team.len()));
    for input in &demo.team {
        let member = team::add_member(store, &project.id, input).await?;
        saga.record(TEAM_MEMBERS, &member.id);
    }

    reporter.step(&format!("{} epics, {} stories", demo.epics.len(), demo.story_count()));
    let mut assignments = Vec::new();
    for demo_epic in &demo.epics {
        let created = epic::create_epic(store, &project.id, &demo_epic.epic).await?;
        saga.record(EPICS, &created.id);

        for demo_story in &demo_epic.stories {
            let input = NewStory {
                epic_id: created.id.clone(),
                ..demo_story.story.clone()
            };
            let s = story::create_story(store, &project.id, &input).await?;
            saga.record(STORIES, &s.id);
            if let Some(sprint_index) = demo_story.sprint {
                assignments.push((s.id, sprint_index));
            }
        }
    }

    reporter.step(&format!("{} sprints", demo.sprints.len()));
    let mut sprint_ids = Vec::with_capacity(demo.sprints.len());
    for demo_sprint in &demo.sprints {
        let created = sprint::create_sprint(store, &project.id, &demo_sprint.sprint).await?;
        saga.record(SPRINTS, &created.id);
        sprint_ids.push(created.id);
    }

    for (story_id, sprint_index) in &assignments {
        let sprint_id = sprint_ids.get(*sprint_index).ok_or_else(|| {
            CoreError::validation(format!("Demo story refers to missing sprint #{}", sprint_index))
        })?;
        story::assign_to_sprint(store, story_id, sprint_id).await?;
    }

    // Status changes come last so completed sprints get their velocity.
    for (demo_sprint, sprint_id) in demo.sprints.iter().zip(&sprint_ids) {
        match demo_sprint.status {
            SprintStatus::Planned => {}
            SprintStatus::Active => {
                sprint::start_sprint(store, sprint_id).await?;
            }
            SprintStatus::Completed => {
                sprint::complete_sprint(store, sprint_id).await?;
            }
        }
    }

    if let Some(canvases) = canvases {
        reporter.step("discovery canvases");
        save_recorded(store, saga, &project.id, &canvases.business_model).await?;
        save_recorded(store, saga, &project.id, &canvases.value_proposition).await?;
        save_recorded(store, saga, &project.id, &canvases.value_stream).await?;
        save_recorded(store, saga, &project.id, &canvases.gap_analysis).await?;
    }

    Ok(project)
}

async fn save_recorded<T: Canvas>(
    store: &dyn DocumentStore,
    saga: &mut Saga<'_>,
    project_id: &str,
    canvas: &T,
) -> CoreResult<()> {
    let existed = canvas::get_canvas::<T>(store, project_id).await?.is_some();
    let record = canvas::save_canvas(store, project_id, canvas).await?;
    if !existed {
        saga.record(T::KIND.collection(), &record.id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::{BUSINESS_MODEL_CANVASES, GAP_ANALYSES};
    use crate::common::ListOptions;
    use scrumkit_store::MemoryStore;
    use std::collections::HashMap;

    fn full_env() -> HashMap<String, String> {
        crate::config::REQUIRED_KEYS
            .iter()
            .map(|k| (k.to_string(), format!("value-of-{}", k)))
            .collect()
    }

    #[tokio::test]
    async fn test_run_seeds_everything() {
        let store = MemoryStore::new();
        let report = run(&store, "demo-user", &SilentReporter).await;
        assert!(report.is_success());
        assert_eq!(report.projects.len(), demo_projects(Utc::now().date_naive()).len());
        assert_eq!(report.documents, store.total_documents().await);

        let first = &report.projects[0];
        let status = canvas::canvas_status(&store, &first.id).await.unwrap();
        assert_eq!(status.completed(), 4);
        assert_eq!(store.count(BUSINESS_MODEL_CANVASES).await, 1);

        let sprints = sprint::list_sprints(&store, &first.id, &ListOptions::default()).await.unwrap();
        assert_eq!(sprints[0].status, SprintStatus::Completed);
        assert_eq!(sprints[0].velocity, Some(16));
        assert_eq!(sprints[1].status, SprintStatus::Active);

        let mine = project::list_projects_for_user(&store, "demo-user").await.unwrap();
        assert_eq!(mine.len(), report.projects.len());
    }

    #[tokio::test]
    async fn test_missing_config_writes_nothing() {
        let store = MemoryStore::new();
        let mut env = full_env();
        env.remove(crate::config::ENV_APP_ID);

        let err = run_with_env(&store, |k| env.get(k).cloned(), "demo-user", &SilentReporter)
            .await
            .unwrap_err();
        match err {
            CoreError::MissingConfig(keys) => assert_eq!(keys, vec!["SCRUMKIT_APP_ID"]),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.total_documents().await, 0);
    }

    #[tokio::test]
    async fn test_run_with_complete_env() {
        let store = MemoryStore::new();
        let env = full_env();
        let report = run_with_env(&store, |k| env.get(k).cloned(), "demo-user", &SilentReporter)
            .await
            .unwrap();
        assert!(report.is_success());
        assert_eq!(store.count(GAP_ANALYSES).await, 1);
    }
}
