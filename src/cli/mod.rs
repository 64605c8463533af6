//! CLI definitions and command implementations for newsbot.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// newsbot - Edit the news bot's config.json stored on GitHub
#[derive(Parser)]
#[command(name = "newsbot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file (default: ~/.config/newsbot/newsbot.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Store GitHub owner, repository and token, then connect
    Setup {
        /// Repository owner (user or organization)
        #[arg(long)]
        owner: Option<String>,

        /// Repository name
        #[arg(long)]
        repo: Option<String>,

        /// Personal access token with contents write access
        #[arg(long)]
        token: Option<String>,
    },

    /// Forget the stored token
    Reset {
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Show keywords, receivers and settings
    Show,

    /// Manage search keywords
    Keyword {
        #[command(subcommand)]
        action: KeywordAction,
    },

    /// Manage extra digest receivers
    Receiver {
        #[command(subcommand)]
        action: ReceiverAction,
    },

    /// Change bot settings
    Settings {
        /// Title similarity threshold for duplicate detection (0-1)
        #[arg(long)]
        similarity: Option<f64>,

        /// Maximum articles collected per keyword
        #[arg(long)]
        max_articles: Option<u32>,
    },

    /// Write the config file locally (as it would be saved)
    Export {
        /// Output file
        #[arg(short, long, default_value = "config.json")]
        output: PathBuf,
    },

    /// List the keyword colors
    Palette,
}

/// Keyword positions are 1-based, as printed by `show`.
#[derive(Subcommand)]
pub enum KeywordAction {
    /// Add a keyword
    Add {
        name: String,

        /// Palette color (default: next color in the palette)
        #[arg(long)]
        color: Option<String>,

        /// Add it switched off
        #[arg(long)]
        disabled: bool,
    },

    /// Delete a keyword
    Remove { index: usize },

    /// Change a keyword's text
    Rename { index: usize, name: String },

    /// Switch a keyword on or off
    Toggle { index: usize },

    /// Change a keyword's color
    Color { index: usize, color: String },
}

/// Receiver positions are 1-based, as printed by `show`.
#[derive(Subcommand)]
pub enum ReceiverAction {
    /// Add a receiver
    Add { email: String },

    /// Delete a receiver
    Remove { index: usize },

    /// Change a receiver's address
    Set { index: usize, email: String },

    /// Switch a receiver on or off
    Toggle { index: usize },
}
