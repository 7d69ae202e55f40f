//! Demo data command.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use scrumkit_core::CoreError;
use scrumkit_core::seed::{self, SeedReporter};

use super::Env;

#[derive(Args)]
pub struct SeedArgs {
    /// Also select the first seeded project
    #[arg(long)]
    pub select: bool,
}

/// Prints seeding progress to stdout.
struct ConsoleReporter;

impl SeedReporter for ConsoleReporter {
    fn project_started(&self, name: &str) {
        println!("{} {}", "▸".cyan(), name.bold());
    }

    fn step(&self, description: &str) {
        println!("  {} {}", "·".dimmed(), description);
    }

    fn project_finished(&self, name: &str, documents: usize) {
        println!(
            "  {} {} ({} documents)",
            "✓".green().bold(),
            name,
            documents.to_string().cyan()
        );
    }

    fn project_failed(&self, name: &str, error: &CoreError) {
        println!("  {} {}: {}", "✗".red().bold(), name, error.to_string().red());
        println!("    {}", "Rolled back everything created for this project.".dimmed());
    }
}

pub async fn execute(args: SeedArgs, env: &Env) -> Result<()> {
    let user = env.user()?;
    // Missing configuration is fatal before anything is opened.
    env.config()?;
    let store = env.store().await?;

    println!();
    println!("  {} {}", "Scrumkit".cyan().bold(), "Demo data".bold());
    println!();

    let report = seed::run_with_env(store.as_ref(), |key| env.source.lookup(key), user, &ConsoleReporter).await?;

    println!();
    if report.projects.is_empty() {
        anyhow::bail!("No demo project could be seeded");
    }

    if args.select {
        if let Some(first) = report.projects.first() {
            let mut ctx = env.project_context(store.clone()).await?;
            ctx.select(&first.id)?;
        }
    }

    println!(
        "{} Seeded {} project(s), {} document(s)",
        "✓".green().bold(),
        report.projects.len(),
        report.documents
    );
    if !report.is_success() {
        println!(
            "{} {} project(s) were rolled back:",
            "!".yellow().bold(),
            report.failures.len()
        );
        for (name, error) in &report.failures {
            println!("  {} {}: {}", "✗".red(), name, error);
        }
    }

    Ok(())
}
