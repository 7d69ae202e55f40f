//! CLI command definitions and handlers.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, warn};

use scrumkit_core::context::{ProjectContext, SelectionStore};
use scrumkit_core::project::model::Project;
use scrumkit_core::{BackendConfig, ConfigSource};
use scrumkit_store::{MemoryStore, RedisStore, SharedStore};

pub mod canvas;
pub mod epic;
pub mod project;
pub mod seed;
pub mod serve;
pub mod sprint;
pub mod story;
pub mod team;

/// Scrumkit - agile planning and discovery canvases
#[derive(Parser)]
#[command(name = "scrumkit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write logs to this file
    #[arg(long, global = true, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Acting user id (owner of projects)
    #[arg(long, global = true, env = "SCRUMKIT_USER")]
    pub user: Option<String>,

    /// TOML file with backend settings, layered under the environment
    #[arg(long, global = true, env = "SCRUMKIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Use a throwaway in-memory store instead of Redis
    #[arg(long, global = true)]
    pub memory: bool,

    /// File remembering the selected project
    #[arg(long, global = true, env = "SCRUMKIT_STATE")]
    pub state: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API and WebSocket server
    Serve(serve::ServeArgs),

    /// Manage projects
    #[command(subcommand)]
    Project(project::ProjectCommands),

    /// Manage epics of the current project
    #[command(subcommand)]
    Epic(epic::EpicCommands),

    /// Manage user stories of the current project
    #[command(subcommand)]
    Story(story::StoryCommands),

    /// Plan and run sprints
    #[command(subcommand)]
    Sprint(sprint::SprintCommands),

    /// Manage the project team
    #[command(subcommand)]
    Team(team::TeamCommands),

    /// Discovery canvases (bmc, vpc, vsm, gap)
    #[command(subcommand)]
    Canvas(canvas::CanvasCommands),

    /// Load demo projects for the current user
    Seed(seed::SeedArgs),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let env = Env {
            source: ConfigSource::new(self.config.as_deref())?,
            memory: self.memory,
            user: self.user,
            state: self.state,
        };

        match self.command {
            Commands::Serve(args) => serve::execute(args, &env).await,
            Commands::Project(cmd) => project::execute(cmd, &env).await,
            Commands::Epic(cmd) => epic::execute(cmd, &env).await,
            Commands::Story(cmd) => story::execute(cmd, &env).await,
            Commands::Sprint(cmd) => sprint::execute(cmd, &env).await,
            Commands::Team(cmd) => team::execute(cmd, &env).await,
            Commands::Canvas(cmd) => canvas::execute(cmd, &env).await,
            Commands::Seed(args) => seed::execute(args, &env).await,
        }
    }
}

/// Global options resolved once and shared by every command.
pub struct Env {
    pub source: ConfigSource,
    memory: bool,
    user: Option<String>,
    state: Option<PathBuf>,
}

impl Env {
    /// Backend configuration. Missing keys are fatal.
    pub fn config(&self) -> Result<BackendConfig> {
        Ok(self.source.load()?)
    }

    /// Open the document store selected by the global flags.
    pub async fn store(&self) -> Result<SharedStore> {
        if self.memory {
            warn!("Using the in-memory store; nothing will be persisted");
            return Ok(Arc::new(MemoryStore::new()));
        }
        let config = self.config()?;
        debug!(redis_url = %config.redis_url, namespace = config.store_namespace(), "Connecting to store");
        let store = RedisStore::connect(&config.redis_url, config.store_namespace())
            .await
            .with_context(|| format!("Could not connect to {}", config.redis_url))?;
        Ok(Arc::new(store))
    }

    pub fn user(&self) -> Result<&str> {
        self.user
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("No user given. Pass --user or set SCRUMKIT_USER."))
    }

    pub fn selection(&self) -> Result<SelectionStore> {
        match &self.state {
            Some(path) => Ok(SelectionStore::new(path)),
            None => Ok(SelectionStore::default_location()?),
        }
    }

    /// The user's projects with the remembered selection restored.
    pub async fn project_context(&self, store: SharedStore) -> Result<ProjectContext> {
        let ctx = ProjectContext::load(store, self.user()?, self.selection()?).await?;
        Ok(ctx)
    }

    /// The project commands operate on: the remembered selection, or the
    /// user's first project.
    pub async fn current_project(&self, store: SharedStore) -> Result<Project> {
        let ctx = self.project_context(store).await?;
        ctx.current().cloned().ok_or_else(|| {
            anyhow::anyhow!("No project found. Run 'scrumkit project new <name>' or 'scrumkit seed' first.")
        })
    }
}

/// Match `given` against the ids of one project's records: an exact id, or
/// a prefix shared by exactly one of them.
pub(crate) fn resolve_id<'a>(
    entity: &str,
    given: &str,
    ids: impl IntoIterator<Item = &'a str>,
) -> Result<String> {
    let ids: Vec<&str> = ids.into_iter().collect();
    if ids.contains(&given) {
        return Ok(given.to_string());
    }
    let matches: Vec<&str> = ids.into_iter().filter(|id| id.starts_with(given)).collect();
    match matches.as_slice() {
        [single] => Ok(single.to_string()),
        [] => anyhow::bail!("{} not found in the current project: {}", entity, given),
        _ => anyhow::bail!("'{}' matches {} {}s; use a longer id", given, matches.len(), entity.to_lowercase()),
    }
}

/// Parse a priority flag value.
pub(crate) fn parse_priority(s: &str) -> Result<scrumkit_core::Priority> {
    scrumkit_core::Priority::from_str(s)
        .ok_or_else(|| anyhow::anyhow!("Unknown priority '{}'. Expected low, medium, high or critical.", s))
}

/// Parse an ISO date flag value.
pub(crate) fn parse_date(s: &str) -> Result<chrono::NaiveDate> {
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("'{}' is not a date (expected YYYY-MM-DD)", s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["scrumkit", "project", "list", "--memory", "--user", "u1"]).unwrap();
        assert!(cli.memory);
        assert_eq!(cli.user.as_deref(), Some("u1"));
        assert!(matches!(cli.command, Commands::Project(_)));
    }

    #[test]
    fn test_resolve_id() {
        let ids = ["3f2a9c10-aaaa", "3f2b0000-bbbb", "9e1d7700-cccc"];
        assert_eq!(resolve_id("Epic", "9e1d7700-cccc", ids).unwrap(), "9e1d7700-cccc");
        assert_eq!(resolve_id("Epic", "9e", ids).unwrap(), "9e1d7700-cccc");
        assert!(resolve_id("Epic", "3f2", ids).unwrap_err().to_string().contains("matches 2 epics"));
        assert!(resolve_id("Epic", "ffff", ids).is_err());
        assert!(resolve_id("Epic", "", ["only"]).is_ok());
    }

    #[test]
    fn test_parse_helpers() {
        assert!(parse_priority("high").is_ok());
        assert!(parse_priority("urgent").is_err());
        assert_eq!(
            parse_date("2024-02-29").unwrap(),
            chrono::NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(parse_date("29/02/2024").is_err());
    }
}
