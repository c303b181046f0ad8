//! Keyword search: BM25 ranking built per call over a passage list.

use std::collections::HashMap;

use crate::document::{Passage, ScoredPassage};

const K1: f32 = 1.2;
const B: f32 = 0.75;

/// Rank `passages` against `query` by BM25 and return the top `k`.
///
/// The ranking is built from scratch on every call; the passage list is the
/// corpus. Passages with a zero score (no query term in common) are dropped.
pub fn bm25_top_k(passages: &[Passage], query: &str, k: usize) -> Vec<ScoredPassage> {
    let query_terms = tokenize(query);
    if query_terms.is_empty() || passages.is_empty() {
        return Vec::new();
    }

    let tokenized: Vec<Vec<String>> = passages.iter().map(|p| tokenize(&p.content)).collect();
    let n_docs = passages.len() as f32;
    let avg_len =
        tokenized.iter().map(Vec::len).sum::<usize>() as f32 / n_docs;

    // Document frequency per query term.
    let mut df: HashMap<&str, usize> = HashMap::new();
    for term in &query_terms {
        let count = tokenized.iter().filter(|tokens| tokens.iter().any(|t| t == term)).count();
        df.insert(term.as_str(), count);
    }

    let mut scored: Vec<ScoredPassage> = passages
        .iter()
        .zip(&tokenized)
        .filter_map(|(passage, tokens)| {
            let doc_len = tokens.len() as f32;
            let mut score = 0.0f32;
            for term in &query_terms {
                let doc_freq = df[term.as_str()] as f32;
                if doc_freq == 0.0 {
                    continue;
                }
                let tf = tokens.iter().filter(|t| *t == term).count() as f32;
                if tf == 0.0 {
                    continue;
                }
                let idf = ((n_docs - doc_freq + 0.5) / (doc_freq + 0.5) + 1.0).ln();
                let norm = tf * (K1 + 1.0) / (tf + K1 * (1.0 - B + B * doc_len / avg_len));
                score += idf * norm;
            }
            if score > 0.0 {
                Some(ScoredPassage { passage: passage.clone(), score })
            } else {
                None
            }
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(k);
    scored
}

/// Lowercase alphanumeric tokenizer.
fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| {
            w.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<Passage> {
        vec![
            Passage::new("Myocardial infarction presents with chest pain and dyspnea."),
            Passage::new("Influenza causes fever, cough, and muscle aches."),
            Passage::new("Chest pain may also indicate angina or reflux."),
        ]
    }

    #[test]
    fn ranks_matching_passages_first() {
        let results = bm25_top_k(&corpus(), "chest pain", 3);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.passage.content.contains("pain")));
        assert!(results[0].score >= results[1].score);
    }

    #[test]
    fn no_overlap_means_no_results() {
        assert!(bm25_top_k(&corpus(), "quantum entanglement", 3).is_empty());
    }

    #[test]
    fn respects_k() {
        let results = bm25_top_k(&corpus(), "chest pain fever", 1);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn empty_query_or_corpus() {
        assert!(bm25_top_k(&corpus(), "   ", 3).is_empty());
        assert!(bm25_top_k(&[], "chest", 3).is_empty());
    }

    #[test]
    fn tokenizer_strips_punctuation_and_case() {
        assert_eq!(tokenize("Chest-pain, NOW!"), vec!["chestpain", "now"]);
    }
}
