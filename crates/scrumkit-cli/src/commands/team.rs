//! Team commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;

use scrumkit_core::ListOptions;
use scrumkit_core::team::{
    self,
    model::{NewTeamMember, TeamMemberPatch, TeamRole},
};
use scrumkit_store::DocumentStore;

use super::{Env, resolve_id};
use crate::output;

#[derive(Subcommand)]
pub enum TeamCommands {
    /// List team members
    List,

    /// Add a team member
    Add(AddMemberArgs),

    /// Change a team member
    Update(UpdateMemberArgs),

    /// Remove a team member
    Remove { id: String },
}

#[derive(Args)]
pub struct AddMemberArgs {
    /// Member name
    pub name: String,

    #[arg(short, long, default_value = "")]
    pub email: String,

    /// product_owner, scrum_master, developer, designer or stakeholder
    #[arg(short, long, default_value = "developer")]
    pub role: String,

    /// Story points per sprint
    #[arg(long)]
    pub capacity: Option<u32>,

    /// Linked user account id
    #[arg(long = "user-id")]
    pub user_id: Option<String>,
}

#[derive(Args)]
pub struct UpdateMemberArgs {
    /// Member ID or unique prefix
    pub id: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(short, long)]
    pub email: Option<String>,

    #[arg(short, long)]
    pub role: Option<String>,

    #[arg(long)]
    pub capacity: Option<u32>,
}

pub async fn execute(cmd: TeamCommands, env: &Env) -> Result<()> {
    let store = env.store().await?;
    let project = env.current_project(store.clone()).await?;
    let store = store.as_ref();

    match cmd {
        TeamCommands::List => {
            let members = team::list_members(store, &project.id, &ListOptions::default()).await?;
            output::print_team_table(&members);
        }

        TeamCommands::Add(args) => {
            let input = NewTeamMember {
                name: args.name,
                email: args.email,
                role: parse_role(&args.role)?,
                user_id: args.user_id,
                capacity: args.capacity,
            };
            input.validate()?;
            let added = team::add_member(store, &project.id, &input).await?;
            println!(
                "{} Added {} as {}",
                "✓".green().bold(),
                added.name.cyan(),
                added.role.as_str()
            );
        }

        TeamCommands::Update(args) => {
            let id = member_id(store, &project.id, &args.id).await?;
            let patch = TeamMemberPatch {
                name: args.name,
                email: args.email,
                role: args.role.as_deref().map(parse_role).transpose()?,
                capacity: args.capacity,
            };
            patch.validate()?;
            let updated = team::update_member(store, &id, &patch).await?;
            println!("{} Updated {}", "✓".green().bold(), updated.name.cyan());
        }

        TeamCommands::Remove { id } => {
            let id = member_id(store, &project.id, &id).await?;
            team::remove_member(store, &id).await?;
            println!("{} Removed team member {}", "✓".green().bold(), id.dimmed());
        }
    }

    Ok(())
}

async fn member_id(store: &dyn DocumentStore, project_id: &str, given: &str) -> Result<String> {
    let members = team::list_members(store, project_id, &ListOptions::default()).await?;
    resolve_id("Team member", given, members.iter().map(|m| m.id.as_str()))
}

fn parse_role(s: &str) -> Result<TeamRole> {
    TeamRole::from_str(s).ok_or_else(|| {
        anyhow::anyhow!(
            "Unknown role '{}'. Expected product_owner, scrum_master, developer, designer or stakeholder.",
            s
        )
    })
}
