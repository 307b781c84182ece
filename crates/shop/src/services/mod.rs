//! Business logic services for the shop.
//!
//! # Services
//!
//! - `mutations` - Apply a [`Command`](crate::prompts::Command) by asking the model
//!   for the replacement state document
//! - `pages` - Render a [`View`](crate::prompts::View) from its cached fragment

pub mod mutations;
pub mod pages;

use std::future::Future;
use std::time::Instant;

use crate::gateway::GatewayError;
use crate::prompts::preview;

/// Run one model call, logging a prompt preview and how long it took.
async fn timed_call<Fut>(call: &'static str, prompt: &str, fut: Fut) -> Result<String, GatewayError>
where
    Fut: Future<Output = Result<String, GatewayError>>,
{
    tracing::info!(call, prompt = %preview(prompt), "Prompting model");
    let started = Instant::now();
    let result = fut.await;
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    match &result {
        Ok(text) => tracing::info!(call, elapsed_ms, response_len = text.len(), "Model responded"),
        Err(e) => tracing::warn!(call, elapsed_ms, error = %e, "Model call failed"),
    }
    result
}
