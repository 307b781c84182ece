//! Page rendering.
//!
//! A page is rendered in two steps: resolve the view's fragment template
//! (generated once, then read from the cache), then ask the model to fill it
//! from the current state. Both replies have markdown code fences stripped.

use crate::error::Result;
use crate::prompts::{RequestParams, View, strip_code_fences};
use crate::state::AppState;

use super::timed_call;

/// Render `view` for a request with `params`.
///
/// # Errors
///
/// Returns an error if template generation or rendering fails, or the
/// fragment cache cannot be read or written.
#[tracing::instrument(skip(state, params), fields(page = view.name()))]
pub async fn render(state: &AppState, view: View, params: &RequestParams) -> Result<String> {
    let instructions = view.instructions(params);

    let template = state
        .fragments()
        .resolve(view.name(), || async {
            let prompt = state.prompts().fragment_template(params, &instructions);
            timed_call("fragment_template", &prompt, state.gateway().complete(&prompt))
                .await
                .map(|text| strip_code_fences(&text))
        })
        .await?;

    let current = state.store().to_json().await;
    let prompt = state
        .prompts()
        .page(&current, params, &template, &instructions);
    let html = timed_call("page", &prompt, state.gateway().complete(&prompt)).await?;
    Ok(strip_code_fences(&html))
}
