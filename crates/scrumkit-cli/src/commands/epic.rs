//! Epic commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;

use scrumkit_core::ListOptions;
use scrumkit_core::epic::{
    self,
    model::{EpicPatch, EpicStatus, NewEpic},
};
use scrumkit_store::DocumentStore;

use super::{Env, parse_priority, resolve_id};
use crate::output;

#[derive(Subcommand)]
pub enum EpicCommands {
    /// List epics of the current project
    List {
        /// Only epics with this status (backlog, in_progress, done, archived)
        #[arg(long)]
        status: Option<String>,

        /// Include archived epics
        #[arg(long)]
        all: bool,
    },

    /// Create an epic
    New(NewEpicArgs),

    /// Show an epic and its progress
    Show { id: String },

    /// Change an epic
    Update(UpdateEpicArgs),

    /// Archive an epic
    Archive { id: String },

    /// Restore an archived epic to the backlog
    Restore { id: String },

    /// Delete an epic permanently. Its stories stay.
    Delete { id: String },
}

#[derive(Args)]
pub struct NewEpicArgs {
    /// Epic title
    pub title: String,

    #[arg(short, long, default_value = "")]
    pub description: String,

    /// Business value, 1-10
    #[arg(long, default_value = "5")]
    pub value: u8,

    /// Effort, 1-10
    #[arg(long, default_value = "5")]
    pub effort: u8,

    /// Priority (low, medium, high, critical)
    #[arg(long, default_value = "medium")]
    pub priority: String,

    /// Display color (#rrggbb); picked automatically when omitted
    #[arg(long)]
    pub color: Option<String>,
}

#[derive(Args)]
pub struct UpdateEpicArgs {
    /// Epic ID or unique prefix
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(short, long)]
    pub description: Option<String>,

    #[arg(long)]
    pub value: Option<u8>,

    #[arg(long)]
    pub effort: Option<u8>,

    #[arg(long)]
    pub priority: Option<String>,

    /// backlog, in_progress or done
    #[arg(long)]
    pub status: Option<String>,

    #[arg(long)]
    pub color: Option<String>,
}

pub async fn execute(cmd: EpicCommands, env: &Env) -> Result<()> {
    let store = env.store().await?;
    let project = env.current_project(store.clone()).await?;
    let store = store.as_ref();

    match cmd {
        EpicCommands::List { status, all } => {
            let options = ListOptions {
                status,
                include_archived: all,
                ..ListOptions::default()
            };
            let epics = epic::list_epics(store, &project.id, &options).await?;
            output::print_epics_table(&epics);
        }

        EpicCommands::New(args) => {
            let input = NewEpic {
                title: args.title,
                description: args.description,
                business_value: args.value,
                effort: args.effort,
                priority: parse_priority(&args.priority)?,
                color: args.color,
            };
            input.validate()?;
            let created = epic::create_epic(store, &project.id, &input).await?;
            println!(
                "{} Created epic: {} ({})",
                "✓".green().bold(),
                created.title.cyan(),
                created.id.dimmed()
            );
        }

        EpicCommands::Show { id } => {
            let id = epic_id(store, &project.id, &id).await?;
            let found = epic::get_epic(store, &id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("Epic not found: {}", id))?;
            let progress = epic::epic_progress(store, &id).await?;
            output::print_epic(&found, &progress);
        }

        EpicCommands::Update(args) => {
            let id = epic_id(store, &project.id, &args.id).await?;
            let patch = EpicPatch {
                title: args.title,
                description: args.description,
                business_value: args.value,
                effort: args.effort,
                priority: args.priority.as_deref().map(parse_priority).transpose()?,
                status: args.status.as_deref().map(parse_status).transpose()?,
                color: args.color,
            };
            patch.validate()?;
            let updated = epic::update_epic(store, &id, &patch).await?;
            println!("{} Updated epic: {}", "✓".green().bold(), updated.title.cyan());
        }

        EpicCommands::Archive { id } => {
            let id = epic_id(store, &project.id, &id).await?;
            let archived = epic::archive_epic(store, &id).await?;
            println!("{} Archived {}", "✓".green().bold(), archived.title.cyan());
        }

        EpicCommands::Restore { id } => {
            let id = epic_id(store, &project.id, &id).await?;
            let restored = epic::restore_epic(store, &id).await?;
            println!("{} Restored {} to the backlog", "✓".green().bold(), restored.title.cyan());
        }

        EpicCommands::Delete { id } => {
            let id = epic_id(store, &project.id, &id).await?;
            epic::delete_epic(store, &id).await?;
            println!("{} Deleted epic {}", "✓".green().bold(), id.dimmed());
        }
    }

    Ok(())
}

/// Resolve an epic id or prefix within the project, archived epics included.
pub(crate) async fn epic_id(store: &dyn DocumentStore, project_id: &str, given: &str) -> Result<String> {
    let options = ListOptions {
        include_archived: true,
        ..ListOptions::default()
    };
    let epics = epic::list_epics(store, project_id, &options).await?;
    resolve_id("Epic", given, epics.iter().map(|e| e.id.as_str()))
}

fn parse_status(s: &str) -> Result<EpicStatus> {
    EpicStatus::from_str(s).ok_or_else(|| {
        anyhow::anyhow!("Unknown epic status '{}'. Expected backlog, in_progress, done or archived.", s)
    })
}
