//! Model gateway: the boundary to the external text-completion service.
//!
//! Handlers never talk HTTP to the model directly. They hold an
//! `Arc<dyn ModelGateway>` so production uses [`OpenAiClient`] and tests use
//! [`ScriptedGateway`].
//!
//! # Variants
//!
//! - [`ModelGateway::complete`] - freeform text (page templates, rendered HTML)
//! - [`ModelGateway::complete_json`] - output constrained to a JSON schema
//!   (replacement state documents)

mod error;
mod openai;
mod scripted;
pub mod types;

use async_trait::async_trait;
use serde_json::Value;

pub use error::GatewayError;
pub use openai::OpenAiClient;
pub use scripted::{CallKind, RecordedCall, ScriptedGateway};

/// A named JSON schema that constrains structured output.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSchema {
    /// Name reported to the API (e.g. "shop").
    pub name: String,
    /// The schema document.
    pub schema: Value,
}

impl OutputSchema {
    /// Create a named schema.
    #[must_use]
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }
}

/// Executes prompts against a completion model.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Complete a prompt and return the generated text.
    ///
    /// # Errors
    ///
    /// Returns an error if the service cannot be reached or rejects the request.
    async fn complete(&self, prompt: &str) -> Result<String, GatewayError>;

    /// Complete a prompt with output constrained to `schema`.
    ///
    /// The returned text is whatever the service produced; callers parse it.
    ///
    /// # Errors
    ///
    /// Returns an error if the service cannot be reached or rejects the request.
    async fn complete_json(
        &self,
        prompt: &str,
        schema: &OutputSchema,
    ) -> Result<String, GatewayError>;
}
