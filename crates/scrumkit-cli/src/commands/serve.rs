//! Web server command.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use scrumkit_web::state::AppState;

use super::Env;

#[derive(Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(long, default_value = "3030", env = "SCRUMKIT_PORT")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
}

pub async fn execute(args: ServeArgs, env: &Env) -> Result<()> {
    let store = env.store().await?;
    let state = AppState::with_store(store);

    println!();
    println!("  {} {}", "Scrumkit".cyan().bold(), "Server".bold());
    println!();
    println!("  {}       http://{}:{}/api", "API".green(), args.host, args.port);
    println!("  {}  ws://{}:{}/ws", "WebSocket".green(), args.host, args.port);
    println!();
    println!("  {}", "Ctrl+C to stop".dimmed());
    println!();

    scrumkit_web::run_server(state, &args.host, args.port).await?;

    Ok(())
}
