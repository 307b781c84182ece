//! Subcommand implementations.

pub mod state;
pub mod views;

use std::path::PathBuf;

use prompt_shop::config::ConfigError;
use prompt_shop::fragments::FragmentError;
use prompt_shop::store::StoreError;

/// Errors surfaced by `ps-cli`.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Fragment(#[from] FragmentError),

    #[error("Unknown page '{0}'")]
    UnknownPage(String),

    #[error("No state at {} (run `ps-cli state seed` first)", .0.display())]
    NoState(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("State is not valid JSON: {0}")]
    InvalidState(#[from] serde_json::Error),
}
