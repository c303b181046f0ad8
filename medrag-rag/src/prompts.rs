//! Prompt templates for the gate and the grounded responder.

use crate::document::ScoredPassage;

/// The sentinel the gate model emits, inside brackets, when no retrieval is
/// needed. Compared exactly and case-sensitively.
pub const NO_RETRIEVAL_SENTINEL: &str = "NO NEED";

/// System framing for the final generation call.
pub const SYSTEM_PERSONA: &str = "\
You are a Medical Assistant specialized in providing information and answering questions \
related to healthcare and medicine.
You must answer professionally and empathetically, taking into account the user's feelings \
and concerns.
";

/// Instruction prompt asking the model to emit a bracketed search query or
/// the bracketed no-retrieval sentinel.
const GATE_TEMPLATE: &str = "\
--- INSTRUCTION ---
You are having a conversation with a {role}.
You have to provide a short query to retrieve the documents that you need inside the brackets like: \"[...]\".
If it is something not related to the medical field, or something you do not need external knowledge to answer, you must write \"[NO NEED]\".
--- END OF INSTRUCTION ---

--- CONVERSATION ---
{conversation}
--- END OF CONVERSATION ---
";

/// Grounding prompt: evidence, transcript, and the answer-only-from-evidence
/// instruction.
const GROUNDED_TEMPLATE: &str = "\
You are a medical expert.
You are having a conversation with a {role} and you have external documents to help you.
Continue the conversation based on the chat history, the context information, and not prior knowledge.
Before using a retrieved document, you must check if it is relevant to the user query. If it is not relevant, you must ignore it.
You use the relevant documents to answer the question and cite the source inside <<<>>>.
If you don't know the answer, you must say \"I don't know\".
---------------------
{documents}
---------------------
Given the documents and not prior knowledge, continue the conversation.
---------------------
{conversation}
---------------------
";

/// Fill the gate template.
pub fn gate_prompt(role: &str, conversation: &str) -> String {
    GATE_TEMPLATE.replace("{role}", role).replace("{conversation}", conversation)
}

/// Fill the grounding template.
pub fn grounded_prompt(role: &str, documents: &str, conversation: &str) -> String {
    GROUNDED_TEMPLATE
        .replace("{role}", role)
        .replace("{documents}", documents)
        .replace("{conversation}", conversation)
}

/// Enumerate evidence passages, each tagged with an ordinal and its cited
/// source. Empty evidence formats to an empty string.
pub fn format_evidence(evidence: &[ScoredPassage]) -> String {
    evidence
        .iter()
        .enumerate()
        .map(|(i, result)| {
            let ordinal = i + 1;
            match result.passage.source() {
                Some(source) => {
                    format!("Document {ordinal} (source: {source}):\n{}", result.passage.content)
                }
                None => format!("Document {ordinal}:\n{}", result.passage.content),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Passage;

    #[test]
    fn gate_prompt_mentions_sentinel_and_conversation() {
        let prompt = gate_prompt("user", "User: hi\nBot:");
        assert!(prompt.contains("[NO NEED]"));
        assert!(prompt.contains("User: hi\nBot:"));
        assert!(prompt.contains("conversation with a user"));
    }

    #[test]
    fn evidence_is_enumerated_with_sources() {
        let evidence = vec![
            ScoredPassage { passage: Passage::with_source("first", "who.int"), score: 0.9 },
            ScoredPassage { passage: Passage::new("second"), score: 0.8 },
        ];
        let formatted = format_evidence(&evidence);
        assert!(formatted.contains("Document 1 (source: who.int):\nfirst"));
        assert!(formatted.contains("Document 2:\nsecond"));
    }

    #[test]
    fn empty_evidence_formats_empty() {
        assert_eq!(format_evidence(&[]), "");
    }
}
