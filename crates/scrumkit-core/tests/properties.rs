//! End-to-end behavior of the planning services against the in-memory store.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use scrumkit_core::canvas::{self, BusinessModelCanvas, GapAnalysis};
use scrumkit_core::collections::{BUSINESS_MODEL_CANVASES, EPICS, PROJECTS, SPRINTS, STORIES};
use scrumkit_core::epic::{self, model::NewEpic};
use scrumkit_core::project::{self, model::{NewProject, ProjectPatch, ProjectStatus}};
use scrumkit_core::seed::{self, SilentReporter};
use scrumkit_core::sprint::{self, model::NewSprint};
use scrumkit_core::story::{self, model::NewStory};
use scrumkit_core::team::{self, model::NewTeamMember};
use scrumkit_core::{CoreError, ListOptions};
use scrumkit_store::{Document, DocumentStore, MemoryStore, Query, StoreError, StoreResult, StoredDocument};

fn date(y: i32, m: u32, d: u32) -> chrono::NaiveDate {
    chrono::NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn every_create_returns_id_and_timestamps() {
    let store = MemoryStore::new();
    let p = project::create_project(&store, &NewProject::new("Apollo", ""), "u1").await.unwrap();
    let e = epic::create_epic(&store, &p.id, &NewEpic::new("Launch")).await.unwrap();
    let s = story::create_story(&store, &p.id, &NewStory::new(&e.id, "Countdown")).await.unwrap();
    let sp = sprint::create_sprint(&store, &p.id, &NewSprint::new("S1", date(2024, 1, 1), date(2024, 1, 14)))
        .await
        .unwrap();
    let m = team::add_member(
        &store,
        &p.id,
        &NewTeamMember {
            name: "Neil".into(),
            email: "neil@example.com".into(),
            ..NewTeamMember::default()
        },
    )
    .await
    .unwrap();

    for (id, created, updated) in [
        (&p.id, p.created_at, p.updated_at),
        (&e.id, e.created_at, e.updated_at),
        (&s.id, s.created_at, s.updated_at),
        (&sp.id, sp.created_at, sp.updated_at),
        (&m.id, m.created_at, m.updated_at),
    ] {
        assert!(!id.is_empty());
        assert_eq!(created, updated);
    }
}

#[tokio::test]
async fn listing_for_user_never_returns_archived_projects() {
    let store = MemoryStore::new();
    for name in ["A", "B", "C"] {
        project::create_project(&store, &NewProject::new(name, ""), "u1").await.unwrap();
    }
    let all = project::list_projects_for_user(&store, "u1").await.unwrap();
    project::archive_project(&store, &all[1].id).await.unwrap();

    let listed = project::list_projects_for_user(&store, "u1").await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|p| p.status != ProjectStatus::Archived));
}

#[tokio::test]
async fn archive_then_restore_only_touches_status() {
    let store = MemoryStore::new();
    let created = project::create_project(&store, &NewProject::new("Apollo", "Moon"), "u1")
        .await
        .unwrap();
    let patch = ProjectPatch {
        description: Some("To the moon".into()),
        ..ProjectPatch::default()
    };
    let before = project::update_project(&store, &created.id, &patch).await.unwrap();

    project::archive_project(&store, &created.id).await.unwrap();
    let after = project::restore_project(&store, &created.id).await.unwrap();

    assert_eq!(after.status, ProjectStatus::Active);
    assert_eq!(after.name, before.name);
    assert_eq!(after.description, before.description);
    assert_eq!(after.owner_id, before.owner_id);
    assert_eq!(after.created_at, before.created_at);
}

#[tokio::test]
async fn saving_a_canvas_twice_keeps_one_document() {
    let store = MemoryStore::new();
    let mut gap = GapAnalysis::default();
    gap.title = "Readiness".into();
    let first = canvas::save_canvas(&store, "p1", &gap).await.unwrap();
    gap.desired_state = "Ready".into();
    let second = canvas::save_canvas(&store, "p1", &gap).await.unwrap();
    assert_eq!(first.id, second.id);

    canvas::save_canvas(&store, "p1", &BusinessModelCanvas::default()).await.unwrap();
    canvas::save_canvas(&store, "p1", &BusinessModelCanvas::default()).await.unwrap();
    assert_eq!(store.count(BUSINESS_MODEL_CANVASES).await, 1);
}

#[tokio::test]
async fn deleting_a_project_leaves_children_behind() {
    let store = MemoryStore::new();
    let p = project::create_project(&store, &NewProject::new("Apollo", ""), "u1").await.unwrap();
    let e = epic::create_epic(&store, &p.id, &NewEpic::new("Launch")).await.unwrap();
    story::create_story(&store, &p.id, &NewStory::new(&e.id, "Countdown")).await.unwrap();

    assert!(project::delete_project(&store, &p.id).await.unwrap());
    assert!(project::get_project(&store, &p.id).await.unwrap().is_none());

    // Known gap: no cascade.
    assert_eq!(store.count(EPICS).await, 1);
    assert_eq!(store.count(STORIES).await, 1);
    assert_eq!(
        story::list_stories(&store, &p.id, &ListOptions::default()).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn seeding_without_config_fails_without_writes() {
    let store = MemoryStore::new();
    let err = seed::run_with_env(&store, |_| None, "u1", &SilentReporter)
        .await
        .unwrap_err();
    match err {
        CoreError::MissingConfig(keys) => assert_eq!(keys.len(), 6),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.total_documents().await, 0);
}

/// Store that starts rejecting sprint inserts after a fixed number of them.
struct FlakySprints {
    inner: MemoryStore,
    allowed: usize,
    seen: AtomicUsize,
}

#[async_trait]
impl DocumentStore for FlakySprints {
    async fn add(&self, collection: &str, data: Document) -> StoreResult<StoredDocument> {
        if collection == SPRINTS && self.seen.fetch_add(1, Ordering::SeqCst) >= self.allowed {
            return Err(StoreError::OperationFailed("quota exceeded".into()));
        }
        self.inner.add(collection, data).await
    }

    async fn set(&self, collection: &str, id: &str, data: Document) -> StoreResult<StoredDocument> {
        self.inner.set(collection, id, data).await
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<StoredDocument>> {
        self.inner.get(collection, id).await
    }

    async fn update(&self, collection: &str, id: &str, patch: Document) -> StoreResult<StoredDocument> {
        self.inner.update(collection, id, patch).await
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        self.inner.delete(collection, id).await
    }

    async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<StoredDocument>> {
        self.inner.query(collection, query).await
    }
}

#[tokio::test]
async fn seed_failure_rolls_back_only_that_project() {
    let memory = MemoryStore::new();
    let store = Arc::new(FlakySprints {
        inner: memory.clone(),
        // The first demo project has three sprints.
        allowed: 3,
        seen: AtomicUsize::new(0),
    });

    let report = seed::run(store.as_ref(), "u1", &SilentReporter).await;
    assert_eq!(report.projects.len(), 1);
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].1.contains("Could not create the sprint."));

    // Only the first project's documents remain.
    assert_eq!(memory.count(PROJECTS).await, 1);
    assert_eq!(memory.total_documents().await, report.documents);
    let survivors = project::list_projects_for_user(&memory, "u1").await.unwrap();
    assert_eq!(survivors[0].id, report.projects[0].id);
}
