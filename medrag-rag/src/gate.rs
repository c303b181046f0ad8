//! The retrieval gate: decides per turn whether external evidence is needed
//! and formulates a compact search query.

use std::sync::Arc;

use medrag_model::Llm;
use tracing::{debug, info};

use crate::error::{RagError, Result};
use crate::history::{ConversationTurn, transcript};
use crate::prompts::{NO_RETRIEVAL_SENTINEL, gate_prompt};

/// Decides whether a conversational turn needs retrieval.
///
/// The gate asks the model to emit either a bracketed short search query or
/// the bracketed no-retrieval sentinel, then parses the bracketed substring.
/// Output that violates the bracket grammar fails with a generation error
/// rather than being silently misinterpreted.
pub struct RetrievalGate {
    llm: Arc<dyn Llm>,
    sentinel: String,
    max_history_turns: usize,
}

impl RetrievalGate {
    /// Create a gate backed by the given model, with the default sentinel
    /// and a 50-turn history window.
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self { llm, sentinel: NO_RETRIEVAL_SENTINEL.to_string(), max_history_turns: 50 }
    }

    /// Override the no-retrieval sentinel.
    pub fn with_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.sentinel = sentinel.into();
        self
    }

    /// Override the number of history turns included in the transcript.
    pub fn with_max_history_turns(mut self, turns: usize) -> Self {
        self.max_history_turns = turns;
        self
    }

    /// Decide whether the current turn needs retrieval.
    ///
    /// Returns `Ok(Some(query))` with a non-blank search query when evidence
    /// is needed, `Ok(None)` when the model emitted the sentinel.
    ///
    /// # Errors
    ///
    /// - [`RagError::Generation`] if the model call fails or its output has
    ///   no bracketed query.
    /// - [`RagError::EmptyQuery`] if the bracketed query is blank.
    pub async fn decide(
        &self,
        history: &[ConversationTurn],
        message: &str,
        role: &str,
    ) -> Result<Option<String>> {
        let conversation = transcript(history, message, self.max_history_turns);
        let prompt = gate_prompt(role, &conversation);

        let raw = self.llm.generate("", &prompt).await?;
        debug!(raw = %raw, "gate model output");

        let extracted = extract_bracketed(&raw)
            .ok_or_else(|| RagError::malformed_gate_output(&raw))?;
        let extracted = extracted.trim();

        if extracted == self.sentinel {
            info!("gate decided no retrieval needed");
            return Ok(None);
        }
        if extracted.is_empty() {
            return Err(RagError::EmptyQuery);
        }

        info!(query = %extracted, "gate formulated retrieval query");
        Ok(Some(extracted.to_string()))
    }
}

/// Extract the substring between the last `[` and the `]` that follows it.
fn extract_bracketed(raw: &str) -> Option<&str> {
    let open = raw.rfind('[')?;
    let rest = &raw[open + 1..];
    let close = rest.find(']')?;
    Some(&rest[..close])
}

#[cfg(test)]
mod tests {
    use super::*;
    use medrag_model::MockLlm;

    fn gate_with(response: &str) -> RetrievalGate {
        RetrievalGate::new(Arc::new(MockLlm::new(vec![response.to_string()])))
    }

    #[tokio::test]
    async fn bracketed_query_is_returned() {
        let gate = gate_with("Sure, here is the query: [heart attack symptoms]");
        let query = gate.decide(&[], "what are heart attack symptoms?", "user").await.unwrap();
        assert_eq!(query.as_deref(), Some("heart attack symptoms"));
    }

    #[tokio::test]
    async fn sentinel_means_no_retrieval_regardless_of_surrounding_text() {
        let gate = gate_with("This is small talk, so: [NO NEED], nothing to look up.");
        let query = gate.decide(&[], "What's the weather today?", "user").await.unwrap();
        assert_eq!(query, None);
    }

    #[tokio::test]
    async fn sentinel_match_is_case_sensitive() {
        let gate = gate_with("[no need]");
        let query = gate.decide(&[], "hello", "user").await.unwrap();
        // Not the sentinel, so it is a (lowercase) query.
        assert_eq!(query.as_deref(), Some("no need"));
    }

    #[tokio::test]
    async fn last_bracket_pair_wins() {
        let gate = gate_with("[draft thoughts] final answer: [influenza treatment]");
        let query = gate.decide(&[], "flu?", "user").await.unwrap();
        assert_eq!(query.as_deref(), Some("influenza treatment"));
    }

    #[tokio::test]
    async fn malformed_output_is_a_generation_error() {
        for raw in ["no brackets at all", "only open [", "only close ]", "] backwards ["] {
            let gate = gate_with(raw);
            let err = gate.decide(&[], "hi", "user").await.unwrap_err();
            assert!(matches!(err, RagError::Generation(_)), "raw: {raw:?}");
        }
    }

    #[tokio::test]
    async fn blank_query_is_empty_query_error() {
        let gate = gate_with("[   ]");
        let err = gate.decide(&[], "hi", "user").await.unwrap_err();
        assert!(matches!(err, RagError::EmptyQuery));
    }

    #[tokio::test]
    async fn provider_failure_propagates_as_generation() {
        let llm = MockLlm::with_script(vec![Err(medrag_model::ModelError::Api {
            message: "400".into(),
        })]);
        let gate = RetrievalGate::new(Arc::new(llm));
        let err = gate.decide(&[], "hi", "user").await.unwrap_err();
        assert!(matches!(err, RagError::Generation(_)));
    }
}
