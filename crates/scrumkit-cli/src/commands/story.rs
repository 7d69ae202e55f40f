//! User story commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;

use scrumkit_core::ListOptions;
use scrumkit_core::story::{
    self,
    model::{NewStory, StoryPatch, StoryStatus},
};
use scrumkit_store::DocumentStore;

use super::epic::epic_id;
use super::sprint::sprint_id;
use super::{Env, parse_priority, resolve_id};
use crate::output;

#[derive(Subcommand)]
pub enum StoryCommands {
    /// List stories of the current project
    List(ListStoriesArgs),

    /// Create a story under an epic
    New(NewStoryArgs),

    /// Show a story
    Show { id: String },

    /// Change a story
    Update(UpdateStoryArgs),

    /// Move a story to another status
    Move {
        /// Story ID or unique prefix
        id: String,

        /// todo, in_progress, review, done or archived
        status: String,
    },

    /// Put a story into a sprint
    Assign {
        /// Story ID or unique prefix
        id: String,

        /// Sprint ID or unique prefix
        sprint: String,
    },

    /// Move a story back to the product backlog
    Unassign { id: String },

    /// Delete a story permanently
    Delete { id: String },
}

#[derive(Args)]
pub struct ListStoriesArgs {
    /// Only stories of this epic
    #[arg(long)]
    pub epic: Option<String>,

    /// Only stories of this sprint
    #[arg(long)]
    pub sprint: Option<String>,

    /// Only stories with this status
    #[arg(long)]
    pub status: Option<String>,

    /// Include archived stories
    #[arg(long)]
    pub all: bool,
}

#[derive(Args)]
pub struct NewStoryArgs {
    /// Story title
    pub title: String,

    /// Epic ID or unique prefix
    #[arg(short, long)]
    pub epic: String,

    #[arg(short, long, default_value = "")]
    pub description: String,

    /// Story points
    #[arg(short, long)]
    pub points: Option<u32>,

    /// Priority (low, medium, high, critical)
    #[arg(long, default_value = "medium")]
    pub priority: String,

    /// Tag; repeat for several
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,

    /// Acceptance criterion; repeat for several
    #[arg(short = 'a', long = "criterion")]
    pub criteria: Vec<String>,

    /// Sprint ID or unique prefix
    #[arg(long)]
    pub sprint: Option<String>,
}

#[derive(Args)]
pub struct UpdateStoryArgs {
    /// Story ID or unique prefix
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(short, long)]
    pub description: Option<String>,

    #[arg(short, long)]
    pub points: Option<u32>,

    #[arg(long)]
    pub priority: Option<String>,

    /// Team member id doing the work
    #[arg(long)]
    pub assignee: Option<String>,

    /// Replace the tags
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,

    /// Replace the acceptance criteria
    #[arg(short = 'a', long = "criterion")]
    pub criteria: Vec<String>,
}

pub async fn execute(cmd: StoryCommands, env: &Env) -> Result<()> {
    let store = env.store().await?;
    let project = env.current_project(store.clone()).await?;
    let store = store.as_ref();

    match cmd {
        StoryCommands::List(args) => {
            let stories = if let Some(epic) = args.epic {
                let epic = epic_id(store, &project.id, &epic).await?;
                story::list_stories_by_epic(store, &epic).await?
            } else if let Some(sprint) = args.sprint {
                let sprint = sprint_id(store, &project.id, &sprint).await?;
                story::list_stories_by_sprint(store, &sprint).await?
            } else {
                let options = ListOptions {
                    status: args.status.as_deref().map(parse_status).transpose()?.map(|s| s.as_str().to_string()),
                    include_archived: args.all,
                    ..ListOptions::default()
                };
                story::list_stories(store, &project.id, &options).await?
            };
            output::print_stories_table(&stories);
        }

        StoryCommands::New(args) => {
            let sprint = match args.sprint {
                Some(s) => Some(sprint_id(store, &project.id, &s).await?),
                None => None,
            };
            let input = NewStory {
                epic_id: epic_id(store, &project.id, &args.epic).await?,
                title: args.title,
                description: args.description,
                story_points: args.points,
                priority: parse_priority(&args.priority)?,
                tags: args.tags,
                acceptance_criteria: args.criteria,
                sprint_id: sprint,
                ..NewStory::default()
            };
            input.validate()?;
            let created = story::create_story(store, &project.id, &input).await?;
            println!(
                "{} Created story: {} ({})",
                "✓".green().bold(),
                created.title.cyan(),
                created.id.dimmed()
            );
        }

        StoryCommands::Show { id } => {
            let id = story_id(store, &project.id, &id).await?;
            let found = story::get_story(store, &id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("Story not found: {}", id))?;
            output::print_story(&found);
        }

        StoryCommands::Update(args) => {
            let id = story_id(store, &project.id, &args.id).await?;
            let patch = StoryPatch {
                title: args.title,
                description: args.description,
                story_points: args.points,
                priority: args.priority.as_deref().map(parse_priority).transpose()?,
                assignee_id: args.assignee,
                tags: (!args.tags.is_empty()).then_some(args.tags),
                acceptance_criteria: (!args.criteria.is_empty()).then_some(args.criteria),
                ..StoryPatch::default()
            };
            patch.validate()?;
            let updated = story::update_story(store, &id, &patch).await?;
            println!("{} Updated story: {}", "✓".green().bold(), updated.title.cyan());
        }

        StoryCommands::Move { id, status } => {
            let id = story_id(store, &project.id, &id).await?;
            let status = parse_status(&status)?;
            let moved = story::set_story_status(store, &id, status).await?;
            println!(
                "{} Moved {} to {}",
                "✓".green().bold(),
                moved.title.cyan(),
                status.as_str().yellow()
            );
        }

        StoryCommands::Assign { id, sprint } => {
            let id = story_id(store, &project.id, &id).await?;
            let sprint = sprint_id(store, &project.id, &sprint).await?;
            let assigned = story::assign_to_sprint(store, &id, &sprint).await?;
            println!(
                "{} Added {} to sprint {}",
                "✓".green().bold(),
                assigned.title.cyan(),
                output::short_id(&sprint).dimmed()
            );
        }

        StoryCommands::Unassign { id } => {
            let id = story_id(store, &project.id, &id).await?;
            let unassigned = story::remove_from_sprint(store, &id).await?;
            println!("{} Moved {} back to the backlog", "✓".green().bold(), unassigned.title.cyan());
        }

        StoryCommands::Delete { id } => {
            let id = story_id(store, &project.id, &id).await?;
            story::delete_story(store, &id).await?;
            println!("{} Deleted story {}", "✓".green().bold(), id.dimmed());
        }
    }

    Ok(())
}

async fn story_id(store: &dyn DocumentStore, project_id: &str, given: &str) -> Result<String> {
    let options = ListOptions {
        include_archived: true,
        ..ListOptions::default()
    };
    let stories = story::list_stories(store, project_id, &options).await?;
    resolve_id("Story", given, stories.iter().map(|s| s.id.as_str()))
}

fn parse_status(s: &str) -> Result<StoryStatus> {
    StoryStatus::from_str(s).ok_or_else(|| {
        anyhow::anyhow!("Unknown story status '{}'. Expected todo, in_progress, review, done or archived.", s)
    })
}
