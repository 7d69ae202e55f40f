//! Project commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;

use scrumkit_core::project::{
    self,
    model::{NewProject, Project, ProjectPatch},
};
use scrumkit_store::SharedStore;

use super::Env;
use crate::output;

#[derive(Subcommand)]
pub enum ProjectCommands {
    /// List your projects
    List {
        /// Show archived projects instead
        #[arg(long)]
        archived: bool,
    },

    /// Create a project and select it
    New(NewProjectArgs),

    /// Show the current project, or the one given
    Show {
        /// Project ID (defaults to the current project)
        id: Option<String>,
    },

    /// Select the project other commands work on
    Use {
        /// Project ID
        id: String,
    },

    /// Rename or re-describe a project
    Update(UpdateProjectArgs),

    /// Archive a project (soft delete)
    Archive { id: String },

    /// Bring an archived project back
    Restore { id: String },

    /// Delete a project permanently. Its epics, stories and sprints stay.
    Delete { id: String },
}

#[derive(Args)]
pub struct NewProjectArgs {
    /// Project name
    pub name: String,

    /// Project description
    #[arg(short, long, default_value = "")]
    pub description: String,
}

#[derive(Args)]
pub struct UpdateProjectArgs {
    /// Project ID
    pub id: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(short, long)]
    pub description: Option<String>,
}

pub async fn execute(cmd: ProjectCommands, env: &Env) -> Result<()> {
    let store = env.store().await?;

    match cmd {
        ProjectCommands::List { archived } => {
            if archived {
                let projects = project::list_archived_projects(store.as_ref(), env.user()?).await?;
                output::print_projects_table(&projects, None);
            } else {
                let ctx = env.project_context(store.clone()).await?;
                output::print_projects_table(ctx.projects(), ctx.current().map(|p| p.id.as_str()));
            }
        }

        ProjectCommands::New(args) => {
            let input = NewProject::new(args.name, args.description);
            input.validate()?;
            let created = project::create_project(store.as_ref(), &input, env.user()?).await?;

            let mut ctx = env.project_context(store.clone()).await?;
            ctx.select(&created.id)?;

            println!(
                "{} Created project: {} ({})",
                "✓".green().bold(),
                created.name.cyan(),
                created.id.dimmed()
            );
        }

        ProjectCommands::Show { id } => {
            let found = match id {
                Some(id) => owned(&store, env, &id).await?,
                None => env.current_project(store.clone()).await?,
            };
            output::print_project(&found);
        }

        ProjectCommands::Use { id } => {
            let mut ctx = env.project_context(store.clone()).await?;
            let selected = ctx.select(&id)?;
            println!("{} Now working on {}", "✓".green().bold(), selected.name.cyan());
        }

        ProjectCommands::Update(args) => {
            owned(&store, env, &args.id).await?;
            let patch = ProjectPatch {
                name: args.name,
                description: args.description,
                ..ProjectPatch::default()
            };
            patch.validate()?;
            let updated = project::update_project(store.as_ref(), &args.id, &patch).await?;
            println!("{} Updated project: {}", "✓".green().bold(), updated.name.cyan());
        }

        ProjectCommands::Archive { id } => {
            owned(&store, env, &id).await?;
            let archived = project::archive_project(store.as_ref(), &id).await?;
            println!("{} Archived {}", "✓".green().bold(), archived.name.cyan());
        }

        ProjectCommands::Restore { id } => {
            owned(&store, env, &id).await?;
            let restored = project::restore_project(store.as_ref(), &id).await?;
            println!("{} Restored {}", "✓".green().bold(), restored.name.cyan());
        }

        ProjectCommands::Delete { id } => {
            let found = owned(&store, env, &id).await?;
            project::delete_project(store.as_ref(), &id).await?;
            println!("{} Deleted project {}", "✓".green().bold(), found.name.cyan());
            println!(
                "  {}",
                "Epics, stories and sprints of this project were left in place.".dimmed()
            );
        }
    }

    Ok(())
}

/// A project owned by the acting user.
async fn owned(store: &SharedStore, env: &Env, id: &str) -> Result<Project> {
    let user = env.user()?;
    project::get_project(store.as_ref(), id)
        .await?
        .filter(|p| p.owner_id == user)
        .ok_or_else(|| anyhow::anyhow!("Project not found: {}", id))
}
