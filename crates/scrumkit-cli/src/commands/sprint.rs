//! Sprint commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;

use scrumkit_core::ListOptions;
use scrumkit_core::sprint::{
    self,
    model::{NewSprint, Sprint, SprintPatch, SprintStatus},
};
use scrumkit_core::story;
use scrumkit_core::team;
use scrumkit_store::DocumentStore;

use super::{Env, parse_date, resolve_id};
use crate::output;

#[derive(Subcommand)]
pub enum SprintCommands {
    /// List sprints of the current project
    List,

    /// Plan a new sprint
    New(NewSprintArgs),

    /// Change a sprint
    Update(UpdateSprintArgs),

    /// Start a planned sprint
    Start { id: String },

    /// Complete a sprint and record its velocity
    Complete { id: String },

    /// Show the sprint board (defaults to the active sprint)
    Board { id: Option<String> },

    /// Committed and completed points against capacity
    Summary { id: Option<String> },

    /// Delete a sprint permanently. Its stories keep their sprint reference.
    Delete { id: String },
}

#[derive(Args)]
pub struct NewSprintArgs {
    /// Sprint name
    pub name: String,

    /// First day (YYYY-MM-DD)
    #[arg(long)]
    pub start: String,

    /// Last day (YYYY-MM-DD)
    #[arg(long)]
    pub end: String,

    /// Sprint goal
    #[arg(short, long, default_value = "")]
    pub goal: String,

    /// Points the team can take on; defaults to the team's total capacity
    #[arg(long)]
    pub capacity: Option<u32>,
}

#[derive(Args)]
pub struct UpdateSprintArgs {
    /// Sprint ID or unique prefix
    pub id: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(short, long)]
    pub goal: Option<String>,

    #[arg(long)]
    pub start: Option<String>,

    #[arg(long)]
    pub end: Option<String>,

    #[arg(long)]
    pub capacity: Option<u32>,
}

pub async fn execute(cmd: SprintCommands, env: &Env) -> Result<()> {
    let store = env.store().await?;
    let project = env.current_project(store.clone()).await?;
    let store = store.as_ref();

    match cmd {
        SprintCommands::List => {
            let sprints = sprint::list_sprints(store, &project.id, &ListOptions::default()).await?;
            output::print_sprints_table(&sprints);
        }

        SprintCommands::New(args) => {
            let capacity = match args.capacity {
                Some(c) => Some(c),
                None => Some(team::team_capacity(store, &project.id).await?).filter(|c| *c > 0),
            };
            let input = NewSprint {
                goal: args.goal,
                capacity,
                ..NewSprint::new(args.name, parse_date(&args.start)?, parse_date(&args.end)?)
            };
            input.validate()?;
            let created = sprint::create_sprint(store, &project.id, &input).await?;
            println!(
                "{} Planned sprint: {} ({} days, {})",
                "✓".green().bold(),
                created.name.cyan(),
                created.duration_days(),
                created.id.dimmed()
            );
        }

        SprintCommands::Update(args) => {
            let id = sprint_id(store, &project.id, &args.id).await?;
            let patch = SprintPatch {
                name: args.name,
                goal: args.goal,
                start_date: args.start.as_deref().map(parse_date).transpose()?,
                end_date: args.end.as_deref().map(parse_date).transpose()?,
                capacity: args.capacity,
                ..SprintPatch::default()
            };
            patch.validate()?;
            let updated = sprint::update_sprint(store, &id, &patch).await?;
            println!("{} Updated sprint: {}", "✓".green().bold(), updated.name.cyan());
        }

        SprintCommands::Start { id } => {
            let id = sprint_id(store, &project.id, &id).await?;
            let started = sprint::start_sprint(store, &id).await?;
            println!("{} Started {}", "✓".green().bold(), started.name.cyan());
        }

        SprintCommands::Complete { id } => {
            let id = sprint_id(store, &project.id, &id).await?;
            let completed = sprint::complete_sprint(store, &id).await?;
            println!(
                "{} Completed {} with a velocity of {} point(s)",
                "✓".green().bold(),
                completed.name.cyan(),
                completed.velocity.unwrap_or(0).to_string().bold()
            );
        }

        SprintCommands::Board { id } => {
            let found = pick_sprint(store, &project.id, id.as_deref()).await?;
            let stories = story::list_stories_by_sprint(store, &found.id).await?;
            output::print_board(&found, &stories);
        }

        SprintCommands::Summary { id } => {
            let found = pick_sprint(store, &project.id, id.as_deref()).await?;
            let summary = sprint::sprint_summary(store, &found.id).await?;
            output::print_sprint_summary(&found, &summary);
        }

        SprintCommands::Delete { id } => {
            let id = sprint_id(store, &project.id, &id).await?;
            sprint::delete_sprint(store, &id).await?;
            println!("{} Deleted sprint {}", "✓".green().bold(), id.dimmed());
        }
    }

    Ok(())
}

pub(crate) async fn sprint_id(store: &dyn DocumentStore, project_id: &str, given: &str) -> Result<String> {
    let sprints = sprint::list_sprints(store, project_id, &ListOptions::default()).await?;
    resolve_id("Sprint", given, sprints.iter().map(|s| s.id.as_str()))
}

/// The sprint named by `given`, or else the active one, or else the next
/// planned one.
async fn pick_sprint(store: &dyn DocumentStore, project_id: &str, given: Option<&str>) -> Result<Sprint> {
    let sprints = sprint::list_sprints(store, project_id, &ListOptions::default()).await?;
    if let Some(given) = given {
        let id = resolve_id("Sprint", given, sprints.iter().map(|s| s.id.as_str()))?;
        return sprints
            .into_iter()
            .find(|s| s.id == id)
            .ok_or_else(|| anyhow::anyhow!("Sprint not found: {}", id));
    }
    default_sprint(sprints).ok_or_else(|| anyhow::anyhow!("No active or planned sprint. Pass a sprint id."))
}

fn default_sprint(sprints: Vec<Sprint>) -> Option<Sprint> {
    let active = sprints.iter().position(|s| s.status == SprintStatus::Active);
    let planned = sprints.iter().position(|s| s.status == SprintStatus::Planned);
    let index = active.or(planned)?;
    sprints.into_iter().nth(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn sprint(name: &str, status: SprintStatus) -> Sprint {
        let day = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        Sprint {
            id: name.to_lowercase(),
            project_id: "p1".into(),
            name: name.into(),
            goal: String::new(),
            start_date: day,
            end_date: day,
            status,
            capacity: None,
            velocity: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_default_sprint_prefers_active() {
        let sprints = vec![
            sprint("One", SprintStatus::Completed),
            sprint("Two", SprintStatus::Planned),
            sprint("Three", SprintStatus::Active),
        ];
        assert_eq!(default_sprint(sprints).unwrap().name, "Three");
    }

    #[test]
    fn test_default_sprint_falls_back_to_planned() {
        let sprints = vec![sprint("One", SprintStatus::Completed), sprint("Two", SprintStatus::Planned)];
        assert_eq!(default_sprint(sprints).unwrap().name, "Two");
        assert!(default_sprint(vec![sprint("Done", SprintStatus::Completed)]).is_none());
    }
}
