//! newsbot CLI - Edit the news bot's config.json on GitHub
//!
//! Usage:
//!   newsbot setup      - Store owner/repo/token and connect
//!   newsbot show       - Show keywords, receivers and settings
//!   newsbot keyword    - Add, remove, rename, toggle or recolor keywords
//!   newsbot receiver   - Add, remove, change or toggle receivers
//!   newsbot settings   - Change similarity threshold / article cap
//!   newsbot export     - Write the config file locally
//!   newsbot reset      - Forget the stored token

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::commands::{self, App};
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("newsbot={}", log_level).parse()?)
                .add_directive(format!("newsbot_config={}", log_level).parse()?),
        )
        .with_target(false)
        .init();

    let app = App::load(cli.config)?;

    match cli.command {
        Commands::Setup { owner, repo, token } => commands::setup(&app, owner, repo, token),
        Commands::Reset { yes } => commands::reset(&app, yes),
        Commands::Show => commands::show(&app),
        Commands::Keyword { action } => commands::keyword(&app, action),
        Commands::Receiver { action } => commands::receiver(&app, action),
        Commands::Settings {
            similarity,
            max_articles,
        } => commands::settings(&app, similarity, max_articles),
        Commands::Export { output } => commands::export(&app, &output),
        Commands::Palette => commands::palette(),
    }
}
