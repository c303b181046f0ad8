//! The grounded responder: orchestrates one conversational turn end-to-end.

use std::sync::Arc;

use medrag_model::{Llm, TokenStream};
use tracing::{error, info};

use crate::config::ResponderConfig;
use crate::document::ScoredPassage;
use crate::error::{RagError, Result};
use crate::gate::RetrievalGate;
use crate::history::{ConversationTurn, transcript};
use crate::prompts::{SYSTEM_PERSONA, format_evidence, grounded_prompt};
use crate::reranker::Reranker;
use crate::store::EvidenceStore;

/// Orchestrates gate → search → rerank → grounded generation.
///
/// Each [`respond`](GroundedResponder::respond) invocation runs the four
/// steps strictly in order; across invocations there is no ordering, and the
/// responder holds no per-request state, so one instance serves concurrent
/// sessions. Construct one via [`GroundedResponder::builder()`].
///
/// # Example
///
/// ```rust,ignore
/// use medrag_rag::{GroundedResponder, ResponderConfig};
///
/// let responder = GroundedResponder::builder()
///     .llm(model)
///     .store(store)
///     .config(ResponderConfig::default())
///     .build()?;
///
/// let answer = responder.respond("What are the symptoms of influenza?", &[]).await?;
/// ```
pub struct GroundedResponder {
    llm: Arc<dyn Llm>,
    store: Arc<EvidenceStore>,
    gate: RetrievalGate,
    reranker: Option<Arc<dyn Reranker>>,
    config: ResponderConfig,
}

impl GroundedResponder {
    /// Create a new [`GroundedResponderBuilder`].
    pub fn builder() -> GroundedResponderBuilder {
        GroundedResponderBuilder::default()
    }

    /// Return a reference to the responder configuration.
    pub fn config(&self) -> &ResponderConfig {
        &self.config
    }

    /// Gather evidence for the turn: gate, then search, then optional rerank.
    ///
    /// Returns an empty list when the gate signals no retrieval is needed.
    async fn gather_evidence(
        &self,
        history: &[ConversationTurn],
        message: &str,
    ) -> Result<Vec<ScoredPassage>> {
        let query = self.gate.decide(history, message, &self.config.role).await?;

        let Some(query) = query else {
            return Ok(Vec::new());
        };

        let evidence = self
            .store
            .search(&query, self.config.top_k, self.config.metric, self.config.threshold)
            .await
            .map_err(|e| {
                error!(error = %e, "evidence search failed");
                e
            })?;

        let evidence = if let Some(reranker) = &self.reranker {
            reranker.rerank(&query, evidence).await.map_err(|e| {
                error!(error = %e, "reranking failed");
                e
            })?
        } else {
            evidence
        };

        info!(query = %query, evidence_count = evidence.len(), "evidence gathered");
        Ok(evidence)
    }

    /// Assemble the grounding prompt for the turn.
    fn grounding_prompt(
        &self,
        history: &[ConversationTurn],
        message: &str,
        evidence: &[ScoredPassage],
    ) -> String {
        let conversation = transcript(history, message, self.config.max_history_turns);
        grounded_prompt(&self.config.role, &format_evidence(evidence), &conversation)
    }

    /// Respond to one message, returning the whole generated answer.
    ///
    /// # Errors
    ///
    /// Propagates gate, search, rerank, and generation errors; see
    /// [`RagError`] for the taxonomy. Store load degradation never surfaces
    /// here; an empty store yields an answer grounded on no evidence.
    pub async fn respond(&self, message: &str, history: &[ConversationTurn]) -> Result<String> {
        let evidence = self.gather_evidence(history, message).await?;
        let prompt = self.grounding_prompt(history, message, &evidence);

        let answer = self.llm.generate(SYSTEM_PERSONA, &prompt).await?;
        info!(answer_len = answer.len(), "turn completed");
        Ok(answer)
    }

    /// Respond to one message as a stream of tokens.
    ///
    /// The stream is single-consumption; dropping it cancels the in-flight
    /// generation call, and no partial results are retained.
    pub async fn respond_stream(
        &self,
        message: &str,
        history: &[ConversationTurn],
    ) -> Result<TokenStream> {
        let evidence = self.gather_evidence(history, message).await?;
        let prompt = self.grounding_prompt(history, message, &evidence);

        let stream = self.llm.generate_stream(SYSTEM_PERSONA, &prompt).await?;
        Ok(stream)
    }
}

/// Builder for constructing a [`GroundedResponder`].
///
/// `llm` and `store` are required; `reranker` is optional and `config`
/// defaults to [`ResponderConfig::default`].
#[derive(Default)]
pub struct GroundedResponderBuilder {
    llm: Option<Arc<dyn Llm>>,
    store: Option<Arc<EvidenceStore>>,
    reranker: Option<Arc<dyn Reranker>>,
    config: Option<ResponderConfig>,
}

impl GroundedResponderBuilder {
    /// Set the chat-completion model used by both the gate and the final
    /// generation call.
    pub fn llm(mut self, llm: Arc<dyn Llm>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Set the evidence store.
    pub fn store(mut self, store: Arc<EvidenceStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set an optional reranker for post-search result reordering.
    pub fn reranker(mut self, reranker: Arc<dyn Reranker>) -> Self {
        self.reranker = Some(reranker);
        self
    }

    /// Set the responder configuration.
    pub fn config(mut self, config: ResponderConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the [`GroundedResponder`], validating that required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Configuration`] if `llm` or `store` is missing.
    pub fn build(self) -> Result<GroundedResponder> {
        let llm = self
            .llm
            .ok_or_else(|| RagError::Configuration("llm is required".to_string()))?;
        let store = self
            .store
            .ok_or_else(|| RagError::Configuration("store is required".to_string()))?;
        let config = self.config.unwrap_or_default();

        let gate = RetrievalGate::new(Arc::clone(&llm))
            .with_max_history_turns(config.max_history_turns);

        Ok(GroundedResponder { llm, store, gate, reranker: self.reranker, config })
    }
}
