//! Mock model for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use futures::StreamExt;

use crate::error::Result;
use crate::llm::{Llm, TokenStream};

/// A scripted mock model.
///
/// Responses are returned in order, one per `generate`/`generate_stream`
/// call. Scripted errors let tests exercise the retry and failure paths.
/// When the script runs out the last response is repeated.
///
/// # Example
///
/// ```rust,ignore
/// use medrag_model::MockLlm;
///
/// let model = MockLlm::new(vec!["[heart attack symptoms]".into()]);
/// let out = model.generate("sys", "user").await?;
/// assert_eq!(out, "[heart attack symptoms]");
/// ```
pub struct MockLlm {
    script: Mutex<Vec<Result<String>>>,
    last: String,
}

impl MockLlm {
    /// Create a mock that replies with the given responses in order.
    pub fn new(responses: Vec<String>) -> Self {
        let last = responses.last().cloned().unwrap_or_default();
        Self { script: Mutex::new(responses.into_iter().rev().map(Ok).collect()), last }
    }

    /// Create a mock from a full script of outcomes, errors included.
    pub fn with_script(script: Vec<Result<String>>) -> Self {
        let last = script
            .iter()
            .rev()
            .find_map(|r| r.as_ref().ok().cloned())
            .unwrap_or_default();
        Self { script: Mutex::new(script.into_iter().rev().collect()), last }
    }

    fn next(&self) -> Result<String> {
        let mut script = self.script.lock().unwrap_or_else(|e| e.into_inner());
        script.pop().unwrap_or_else(|| Ok(self.last.clone()))
    }
}

#[async_trait]
impl Llm for MockLlm {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, _system: &str, _user: &str) -> Result<String> {
        self.next()
    }

    async fn generate_stream(&self, _system: &str, _user: &str) -> Result<TokenStream> {
        let text = self.next()?;
        let tokens: Vec<Result<String>> = text
            .split_inclusive(' ')
            .map(|t| Ok(t.to_string()))
            .collect();
        Ok(futures::stream::iter(tokens).boxed())
    }
}
