//! Shared helpers for integration tests.
#![allow(dead_code)]

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use async_trait::async_trait;
use medrag_rag::{
    EmbeddingProvider, EvidenceStore, IndexEntry, InMemoryVectorIndex, Passage, Result,
};

/// Deterministic bag-of-words embedder: tokens are hashed into a fixed number
/// of buckets and counted. Texts sharing vocabulary get similar vectors.
pub struct HashEmbedder {
    dims: usize,
}

impl HashEmbedder {
    pub fn new(dims: usize) -> Self {
        Self { dims }
    }

    fn bucket(&self, token: &str) -> usize {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        token.hash(&mut hasher);
        (hasher.finish() as usize) % self.dims
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dims];
        for token in text.split_whitespace() {
            let token: String = token
                .chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase();
            if !token.is_empty() {
                vector[self.bucket(&token)] += 1.0;
            }
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}

/// A small medical corpus.
pub fn medical_passages() -> Vec<Passage> {
    vec![
        Passage::with_source(
            "Myocardial infarction, commonly called a heart attack, presents with chest pain, \
             shortness of breath, and sweating. Immediate treatment restores blood flow.",
            "cardiology-handbook",
        ),
        Passage::with_source(
            "Influenza is a viral respiratory infection causing fever, cough, sore throat, \
             and muscle aches. Most cases resolve within two weeks.",
            "infectious-diseases-atlas",
        ),
        Passage::with_source(
            "Type 2 diabetes is managed with diet, exercise, metformin, and regular \
             monitoring of blood glucose levels.",
            "endocrinology-review",
        ),
    ]
}

/// Build a store over [`medical_passages`] with a [`HashEmbedder`].
pub async fn medical_store(with_passage_list: bool) -> Arc<EvidenceStore> {
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(HashEmbedder::new(64));
    let passages = medical_passages();

    let mut entries = Vec::new();
    for passage in &passages {
        let embedding = embedder.embed(&passage.content).await.unwrap();
        entries.push(IndexEntry { passage: passage.clone(), embedding });
    }

    let index = Arc::new(InMemoryVectorIndex::from_entries(entries));
    let passage_list = with_passage_list.then_some(passages);
    Arc::new(EvidenceStore::new(index, passage_list, embedder))
}
