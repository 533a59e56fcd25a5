//! Huddle CLI - Database migrations and site configuration tools.
//!
//! # Usage
//!
//! ```bash
//! # Run admin database migrations
//! huddle-cli migrate
//!
//! # Validate the site configuration document
//! huddle-cli config check --path config.json
//!
//! # Print the site configuration with secrets redacted
//! huddle-cli config show
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `config check` - Validate the site configuration file
//! - `config show` - Print the redacted site configuration

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "huddle-cli")]
#[command(author, version, about = "Huddle admin CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Inspect the site configuration document
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate the document and report every failing field
    Check {
        /// Document path (defaults to `HUDDLE_SITE_CONFIG_PATH`, then `config.json`)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },
    /// Print the document with secrets redacted
    Show {
        /// Document path (defaults to `HUDDLE_SITE_CONFIG_PATH`, then `config.json`)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::admin().await?,
        Commands::Config { action } => match action {
            ConfigAction::Check { path } => commands::config::check(path).await?,
            ConfigAction::Show { path } => commands::config::show(path).await?,
        },
    }
    Ok(())
}
