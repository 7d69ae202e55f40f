//! Collection names in the hosted document store.
//!
//! These must match the deployed database exactly.

pub const PROJECTS: &str = "projects";
pub const TEAM_MEMBERS: &str = "teamMembers";
pub const EPICS: &str = "epics";
pub const STORIES: &str = "stories";
pub const SPRINTS: &str = "sprints";
pub const USERS: &str = "users";
pub const AUTH_ACCOUNTS: &str = "authAccounts";

pub const BUSINESS_MODEL_CANVASES: &str = "businessModelCanvases";
pub const VALUE_PROPOSITION_CANVASES: &str = "valuePropositionCanvases";
pub const VALUE_STREAM_MAPS: &str = "valueStreamMaps";
pub const GAP_ANALYSES: &str = "gapAnalyses";

/// Foreign key linking documents to their project.
pub const PROJECT_ID: &str = "projectId";
