//! Discovery canvas commands.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use colored::Colorize;

use scrumkit_core::canvas::{
    self, ActionItem, ActionStatus, BusinessModelCanvas, Canvas, CanvasKind, GapAnalysis, GapItem,
    ProcessStep, ValuePropositionCanvas, ValueStreamMap,
};
use scrumkit_store::DocumentStore;

use super::{Env, parse_date, parse_priority, resolve_id};
use crate::output;

#[derive(Subcommand)]
pub enum CanvasCommands {
    /// Which canvases the current project has
    Status,

    /// Show a canvas (bmc, vpc, vsm, gap)
    Show { kind: String },

    /// Print a canvas as JSON
    Export { kind: String },

    /// Replace a canvas with the contents of a JSON file
    Import {
        kind: String,

        /// JSON file
        file: PathBuf,
    },

    /// Delete a canvas
    Clear { kind: String },

    /// Append a step to the value stream map
    AddStep(AddStepArgs),

    /// Remove a value stream step
    RemoveStep { id: String },

    /// Record a gap between current and desired state
    AddGap(AddGapArgs),

    /// Record an action that closes a gap
    AddAction(AddActionArgs),

    /// Change the status of a gap analysis action
    ActionStatus {
        /// Action ID or unique prefix
        id: String,

        /// open, in_progress or done
        status: String,
    },
}

#[derive(Args)]
pub struct AddStepArgs {
    /// Step name
    pub name: String,

    /// Working time
    #[arg(long, default_value = "0")]
    pub process: f64,

    /// Waiting time before the next step
    #[arg(long, default_value = "0")]
    pub wait: f64,

    /// The customer would pay for this step
    #[arg(long)]
    pub value_adding: bool,

    #[arg(long, default_value = "")]
    pub owner: String,
}

#[derive(Args)]
pub struct AddGapArgs {
    /// Area the gap is in
    pub area: String,

    #[arg(long, default_value = "")]
    pub current: String,

    #[arg(long, default_value = "")]
    pub desired: String,

    /// What is missing
    #[arg(long, default_value = "")]
    pub gap: String,

    #[arg(long, default_value = "medium")]
    pub priority: String,
}

#[derive(Args)]
pub struct AddActionArgs {
    /// What to do
    pub description: String,

    #[arg(long, default_value = "")]
    pub owner: String,

    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<String>,

    /// Gap ID or unique prefix this action addresses
    #[arg(long)]
    pub gap: Option<String>,
}

pub async fn execute(cmd: CanvasCommands, env: &Env) -> Result<()> {
    let store = env.store().await?;
    let project = env.current_project(store.clone()).await?;
    let store = store.as_ref();
    let project_id = project.id.as_str();

    match cmd {
        CanvasCommands::Status => {
            let status = canvas::canvas_status(store, project_id).await?;
            output::print_canvas_status(&status);
        }

        CanvasCommands::Show { kind } => match canvas::parse_kind(&kind)? {
            CanvasKind::BusinessModel => {
                output::print_business_model(&load_or_default::<BusinessModelCanvas>(store, project_id).await?)
            }
            CanvasKind::ValueProposition => {
                output::print_value_proposition(&load_or_default::<ValuePropositionCanvas>(store, project_id).await?)
            }
            CanvasKind::ValueStream => {
                output::print_value_stream(&load_or_default::<ValueStreamMap>(store, project_id).await?)
            }
            CanvasKind::GapAnalysis => {
                output::print_gap_analysis(&load_or_default::<GapAnalysis>(store, project_id).await?)
            }
        },

        CanvasCommands::Export { kind } => {
            let json = match canvas::parse_kind(&kind)? {
                CanvasKind::BusinessModel => export::<BusinessModelCanvas>(store, project_id).await?,
                CanvasKind::ValueProposition => export::<ValuePropositionCanvas>(store, project_id).await?,
                CanvasKind::ValueStream => export::<ValueStreamMap>(store, project_id).await?,
                CanvasKind::GapAnalysis => export::<GapAnalysis>(store, project_id).await?,
            };
            println!("{}", json);
        }

        CanvasCommands::Import { kind, file } => {
            let kind = canvas::parse_kind(&kind)?;
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Could not read {}", file.display()))?;
            match kind {
                CanvasKind::BusinessModel => import::<BusinessModelCanvas>(store, project_id, &raw).await?,
                CanvasKind::ValueProposition => import::<ValuePropositionCanvas>(store, project_id, &raw).await?,
                CanvasKind::ValueStream => import::<ValueStreamMap>(store, project_id, &raw).await?,
                CanvasKind::GapAnalysis => import::<GapAnalysis>(store, project_id, &raw).await?,
            }
            println!("{} Saved {}", "✓".green().bold(), kind.title().cyan());
        }

        CanvasCommands::Clear { kind } => {
            let kind = canvas::parse_kind(&kind)?;
            if canvas::delete_canvas(store, kind, project_id).await? {
                println!("{} Cleared {}", "✓".green().bold(), kind.title().cyan());
            } else {
                println!("{}", format!("No {} to clear.", kind.title()).dimmed());
            }
        }

        CanvasCommands::AddStep(args) => {
            let mut map = load_or_default::<ValueStreamMap>(store, project_id).await?;
            let mut step = ProcessStep::new(args.name, args.process, args.wait, args.value_adding);
            step.owner = args.owner;
            let id = map.add_step(step);
            canvas::save_canvas(store, project_id, &map).await?;
            println!("{} Added step {}", "✓".green().bold(), output::short_id(&id).dimmed());
        }

        CanvasCommands::RemoveStep { id } => {
            let mut map = load_or_default::<ValueStreamMap>(store, project_id).await?;
            let id = resolve_id("Step", &id, map.steps.iter().map(|s| s.id.as_str()))?;
            map.remove_step(&id);
            canvas::save_canvas(store, project_id, &map).await?;
            println!("{} Removed step {}", "✓".green().bold(), output::short_id(&id).dimmed());
        }

        CanvasCommands::AddGap(args) => {
            let mut analysis = load_or_default::<GapAnalysis>(store, project_id).await?;
            let id = analysis.add_gap_item(GapItem {
                area: args.area,
                current: args.current,
                desired: args.desired,
                gap: args.gap,
                priority: parse_priority(&args.priority)?,
                ..GapItem::default()
            });
            canvas::save_canvas(store, project_id, &analysis).await?;
            println!("{} Added gap {}", "✓".green().bold(), output::short_id(&id).dimmed());
        }

        CanvasCommands::AddAction(args) => {
            let mut analysis = load_or_default::<GapAnalysis>(store, project_id).await?;
            let gap_item_id = args
                .gap
                .as_deref()
                .map(|g| resolve_id("Gap", g, analysis.gap_items.iter().map(|i| i.id.as_str())))
                .transpose()?;
            let id = analysis.add_action_item(ActionItem {
                description: args.description,
                owner: args.owner,
                due_date: args.due.as_deref().map(parse_date).transpose()?,
                gap_item_id,
                ..ActionItem::default()
            });
            canvas::save_canvas(store, project_id, &analysis).await?;
            println!("{} Added action {}", "✓".green().bold(), output::short_id(&id).dimmed());
        }

        CanvasCommands::ActionStatus { id, status } => {
            let status = ActionStatus::from_str(&status)
                .ok_or_else(|| anyhow::anyhow!("Unknown action status '{}'. Expected open, in_progress or done.", status))?;
            let mut analysis = load_or_default::<GapAnalysis>(store, project_id).await?;
            let id = resolve_id("Action", &id, analysis.action_items.iter().map(|a| a.id.as_str()))?;
            analysis.set_action_status(&id, status);
            canvas::save_canvas(store, project_id, &analysis).await?;
            println!(
                "{} Gap analysis {:.0}% complete",
                "✓".green().bold(),
                analysis.completion_rate() * 100.0
            );
        }
    }

    Ok(())
}

async fn load_or_default<T: Canvas>(store: &dyn DocumentStore, project_id: &str) -> Result<T> {
    Ok(canvas::get_canvas::<T>(store, project_id)
        .await?
        .map(|record| record.canvas)
        .unwrap_or_default())
}

async fn export<T: Canvas>(store: &dyn DocumentStore, project_id: &str) -> Result<String> {
    let data = load_or_default::<T>(store, project_id).await?;
    Ok(serde_json::to_string_pretty(&data)?)
}

async fn import<T: Canvas>(store: &dyn DocumentStore, project_id: &str, raw: &str) -> Result<()> {
    let data: T = serde_json::from_str(raw).context("The file is not a valid canvas")?;
    canvas::save_canvas(store, project_id, &data).await?;
    Ok(())
}
