//! State document commands.

use prompt_shop::config::StorageConfig;
use prompt_shop::store::StateStore;
use prompt_shop_core::{ShopState, StateSummary};
use serde_json::Value;
use tracing::info;

use super::CliError;

/// Copy the seed fixture into the cache.
///
/// # Errors
///
/// Returns an error if the fixture cannot be copied.
pub async fn seed(storage: &StorageConfig, force: bool) -> Result<(), CliError> {
    let path = storage.state_path();
    if StateStore::seed(&path, &storage.seed_path, force).await? {
        info!(path = %path.display(), "State seeded");
    } else {
        info!(
            path = %path.display(),
            "State already exists, leaving it alone (use --force to overwrite)"
        );
    }
    Ok(())
}

/// Print the cached state document followed by a summary.
///
/// # Errors
///
/// Returns an error if there is no state yet or it is not JSON.
pub async fn show(storage: &StorageConfig) -> Result<(), CliError> {
    let path = storage.state_path();
    let raw = match tokio::fs::read_to_string(&path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(CliError::NoState(path)),
        Err(source) => return Err(CliError::Read { path, source }),
    };
    let document: Value = serde_json::from_str(&raw)?;
    let summary = StateSummary::of(&document);

    #[allow(clippy::print_stdout)]
    {
        println!("{}", serde_json::to_string_pretty(&document)?);
        println!();
        println!("{}", describe(&summary));
        // Only a document that parses strictly has a total.
        match ShopState::from_value(&document) {
            Ok(state) => println!("Cart total: {}", state.cart_total()),
            Err(e) => println!("Cart total unavailable: {e}"),
        }
    }
    Ok(())
}

fn describe(summary: &StateSummary) -> String {
    let mut text = format!(
        "{} products, {} line items, {} units in cart",
        summary.products, summary.line_items, summary.units
    );
    if summary.dangling > 0 {
        text.push_str(&format!(
            " ({} line items reference unknown products)",
            summary.dangling
        ));
    }
    text
}
