//! # Cloakgate - Web Unblocker Front End
//!
//! Resolves a URL or search phrase into a request against an external proxy,
//! keeps a local navigation history, and manages lightweight settings and
//! tab cloaking. A support chat answers questions and flags turns that need
//! a human.

mod app;
mod config;
pub mod constants;
mod history;
mod navigation;
mod session;
mod settings;
mod store;
mod support;
mod utils;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;

/// Cloakgate - browse through the proxy with local history and tab cloaking
#[derive(Parser, Debug)]
#[command(name = "cloakgate", version, about = "A web unblocker front end")]
struct Cli {
    /// State database path (history, settings, cloak profile)
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Config file path (default: ~/.config/cloakgate/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log filter when RUST_LOG is unset (e.g. "debug", "cloakgate=trace")
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Disable the support chat (no API calls)
    #[arg(long)]
    no_ai: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve a URL or search phrase and print the proxy redirect
    Go {
        /// URL or search words
        #[arg(required = true, num_args = 1..)]
        input: Vec<String>,
    },
    /// Browse and manage navigation history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// Show or change settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Show or change the tab cloak
    Cloak {
        #[command(subcommand)]
        action: CloakAction,
    },
    /// Ask the support assistant a question
    Support {
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },
    /// Clear history and reset settings and cloak to defaults
    ResetAll {
        /// Skip the confirmation check
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum HistoryAction {
    /// List records, most recent first
    List {
        #[arg(long, short = 'n')]
        limit: Option<usize>,
    },
    /// Find records by title, url, keyword or category
    Search { query: String },
    /// Remove one record by id
    Remove { id: String },
    /// Remove every record
    Clear,
    /// Remove records older than the retention window
    Prune {
        /// Age limit in days; defaults to the auto-clear setting
        #[arg(long)]
        days: Option<i64>,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    /// Print current settings
    Show,
    /// Change settings, e.g. `set theme=light save-history=false`
    Set {
        #[arg(required = true, num_args = 1.., value_name = "KEY=VALUE")]
        assignments: Vec<String>,
    },
    /// Restore default settings
    Reset,
}

#[derive(Subcommand, Debug)]
pub enum CloakAction {
    /// Print the current cloak profile
    Show,
    /// Set a custom cloak
    Set {
        title: String,
        #[arg(long, default_value = "custom")]
        icon_type: String,
        #[arg(long)]
        icon_url: Option<String>,
        #[arg(long)]
        css: Option<String>,
    },
    /// Use a named preset
    Preset { name: String },
    /// List available presets
    Presets,
    /// Re-apply the current cloak to the terminal title
    Apply,
    /// Restore the default cloak
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // API key may live in ~/.config/cloakgate/.env
    let _ = dotenvy::from_path(constants::env_file_path());

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    if let Some(db) = cli.db {
        config.database_path = db;
    }

    let mut app = app::App::new(config, cli.no_ai)?;
    app.run(cli.command).await
}
