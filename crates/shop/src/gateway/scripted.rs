//! Deterministic gateway that replays canned replies.
//!
//! Used by tests and local demos. Replies are consumed in order; every call is
//! recorded so tests can assert how often (and with what) the model was asked.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use super::{GatewayError, ModelGateway, OutputSchema};

/// Which gateway variant was called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Text,
    Json,
}

/// A call observed by [`ScriptedGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub kind: CallKind,
    pub prompt: String,
    /// Schema name for JSON calls.
    pub schema: Option<String>,
}

#[derive(Debug)]
enum Reply {
    Text(String),
    Failure { status: u16, message: String },
}

/// A [`ModelGateway`] that answers from a queue of canned replies.
#[derive(Debug, Default)]
pub struct ScriptedGateway {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedGateway {
    /// An empty script. Any call fails until replies are pushed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A script that answers with `replies`, in order.
    #[must_use]
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let gateway = Self::new();
        for reply in replies {
            gateway.push_reply(reply);
        }
        gateway
    }

    /// Queue a successful reply.
    pub fn push_reply(&self, text: impl Into<String>) {
        lock(&self.replies).push_back(Reply::Text(text.into()));
    }

    /// Queue an API failure with the given HTTP status.
    pub fn push_failure(&self, status: u16, message: impl Into<String>) {
        lock(&self.replies).push_back(Reply::Failure {
            status,
            message: message.into(),
        });
    }

    /// Every call made so far.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    /// Number of calls made so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Replies not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        lock(&self.replies).len()
    }

    fn answer(&self, call: RecordedCall) -> Result<String, GatewayError> {
        lock(&self.calls).push(call);
        match lock(&self.replies).pop_front() {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Failure { status, message }) => Err(GatewayError::Api {
                status,
                error_type: "scripted_failure".to_string(),
                message,
            }),
            None => Err(GatewayError::Api {
                status: 503,
                error_type: "script_exhausted".to_string(),
                message: "no scripted reply left".to_string(),
            }),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl ModelGateway for ScriptedGateway {
    async fn complete(&self, prompt: &str) -> Result<String, GatewayError> {
        self.answer(RecordedCall {
            kind: CallKind::Text,
            prompt: prompt.to_string(),
            schema: None,
        })
    }

    async fn complete_json(
        &self,
        prompt: &str,
        schema: &OutputSchema,
    ) -> Result<String, GatewayError> {
        self.answer(RecordedCall {
            kind: CallKind::Json,
            prompt: prompt.to_string(),
            schema: Some(schema.name.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replies_in_order_and_records_calls() {
        let gateway = ScriptedGateway::with_replies(["first", "second"]);
        let schema = OutputSchema::new("shop", serde_json::json!({}));

        assert_eq!(gateway.complete("a").await.expect("first"), "first");
        assert_eq!(
            gateway.complete_json("b", &schema).await.expect("second"),
            "second"
        );

        let calls = gateway.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls.first().map(|c| c.kind), Some(CallKind::Text));
        assert_eq!(
            calls.get(1).and_then(|c| c.schema.clone()).as_deref(),
            Some("shop")
        );
        assert_eq!(gateway.remaining(), 0);
    }

    #[tokio::test]
    async fn test_exhausted_script_fails() {
        let gateway = ScriptedGateway::new();
        let err = gateway.complete("anything").await.expect_err("no replies");
        assert!(matches!(err, GatewayError::Api { status: 503, .. }));
        assert_eq!(gateway.call_count(), 1);
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let gateway = ScriptedGateway::new();
        gateway.push_failure(500, "boom");
        let err = gateway.complete("x").await.expect_err("failure");
        assert!(matches!(err, GatewayError::Api { status: 500, ref message, .. } if message == "boom"));
    }
}
