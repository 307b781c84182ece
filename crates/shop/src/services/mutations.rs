//! State mutations.

use prompt_shop_core::StateSummary;

use crate::error::Result;
use crate::prompts::Command;
use crate::state::AppState;

use super::timed_call;

/// Apply `command`: prompt with the current state, then persist the model's
/// replacement document.
///
/// Dangling cart references in the new document are logged, never repaired.
///
/// # Errors
///
/// Returns an error if the model call fails, the reply is not an acceptable
/// state document, or the state file cannot be written. The stored state is
/// unchanged in every error case.
#[tracing::instrument(skip(state), fields(command = command.name()))]
pub async fn apply(state: &AppState, command: &Command) -> Result<StateSummary> {
    let current = state.store().to_json().await;
    let prompt = state.prompts().mutation(&current, &command.instruction());

    let raw = timed_call(
        "mutation",
        &prompt,
        state.gateway().complete_json(&prompt, state.output_schema()),
    )
    .await?;

    let document = state.store().replace(&raw).await?;
    let summary = StateSummary::of(&document);
    tracing::info!(
        products = summary.products,
        line_items = summary.line_items,
        units = summary.units,
        "State replaced"
    );
    if summary.dangling > 0 {
        tracing::warn!(
            dangling = summary.dangling,
            "Cart references products that do not exist"
        );
    }
    Ok(summary)
}
