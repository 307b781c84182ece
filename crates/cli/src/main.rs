//! PromptShop CLI - state and page cache management.
//!
//! # Usage
//!
//! ```bash
//! # Copy the seed fixture into the cache (only if no state exists yet)
//! ps-cli state seed
//!
//! # Reset the state to the seed fixture
//! ps-cli state seed --force
//!
//! # Print the cached state document with a summary
//! ps-cli state show
//!
//! # List cached page templates
//! ps-cli views list
//!
//! # Drop cached page templates so they are regenerated on next render
//! ps-cli views clear
//! ps-cli views clear cart products
//! ```
//!
//! Paths come from the same `SHOP_*` environment variables as the server.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use prompt_shop::config::StorageConfig;

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "ps-cli")]
#[command(author, version, about = "PromptShop CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the persisted state document
    State {
        #[command(subcommand)]
        action: StateAction,
    },
    /// Manage cached page templates
    Views {
        #[command(subcommand)]
        action: ViewsAction,
    },
}

#[derive(Subcommand)]
enum StateAction {
    /// Copy the seed fixture into the cache
    Seed {
        /// Overwrite an existing state document
        #[arg(short, long)]
        force: bool,
    },
    /// Print the state document and a summary
    Show,
}

#[derive(Subcommand)]
enum ViewsAction {
    /// List cached page templates
    List,
    /// Delete cached page templates (all when no page is named)
    Clear {
        /// Page names, e.g. `cart` or `admin_products`
        pages: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let storage = StorageConfig::from_env()?;
    match cli.command {
        Commands::State { action } => match action {
            StateAction::Seed { force } => commands::state::seed(&storage, force).await?,
            StateAction::Show => commands::state::show(&storage).await?,
        },
        Commands::Views { action } => match action {
            ViewsAction::List => commands::views::list(&storage).await?,
            ViewsAction::Clear { pages } => commands::views::clear(&storage, &pages).await?,
        },
    }
    Ok(())
}
