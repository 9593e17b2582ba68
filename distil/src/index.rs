//! In-memory vector index with JSON persistence.
//!
//! Brute-force cosine search over embedded documents. Small corpora only;
//! the whole index is held in memory and persisted as one JSON file.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::embedding::{EmbeddingProvider, cosine_similarity};
use crate::error::Result;

/// A document stored in the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Stable identifier.
    pub id: String,
    /// Original text.
    pub text: String,
    /// Arbitrary caller metadata.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub metadata: Value,
    /// Embedding vector.
    pub embedding: Vec<f32>,
}

impl Document {
    /// Create a document with a fresh id.
    #[must_use]
    pub fn new(text: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            metadata: Value::Null,
            embedding,
        }
    }

    /// Attach metadata to the document.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A search hit with its similarity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scored {
    /// The matching document.
    pub document: Document,
    /// Cosine similarity to the query, in `[-1.0, 1.0]`.
    pub score: f32,
}

/// Brute-force cosine similarity index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VectorIndex {
    documents: Vec<Document>,
}

impl VectorIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index by embedding a batch of texts.
    ///
    /// # Errors
    ///
    /// Propagates embedding provider failures.
    pub async fn from_texts<E: EmbeddingProvider>(
        provider: &E,
        texts: Vec<String>,
    ) -> Result<Self> {
        let embeddings = provider.embed(&texts).await?;
        let documents = texts
            .into_iter()
            .zip(embeddings)
            .map(|(text, embedding)| Document::new(text, embedding))
            .collect();
        Ok(Self { documents })
    }

    /// Add a document.
    pub fn insert(&mut self, document: Document) {
        self.documents.push(document);
    }

    /// Embed `text` and add it as a document, returning its id.
    ///
    /// # Errors
    ///
    /// Propagates embedding provider failures.
    pub async fn insert_text<E: EmbeddingProvider>(
        &mut self,
        provider: &E,
        text: impl Into<String>,
    ) -> Result<String> {
        let text = text.into();
        let embedding = provider.embed_one(&text).await?;
        let document = Document::new(text, embedding);
        let id = document.id.clone();
        self.insert(document);
        Ok(id)
    }

    /// Number of stored documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns `true` if the index holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// All stored documents.
    #[must_use]
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// The `k` documents most similar to the query vector, best first.
    #[must_use]
    pub fn top_k(&self, query: &[f32], k: usize) -> Vec<Scored> {
        let mut scored: Vec<Scored> = self
            .documents
            .iter()
            .map(|document| Scored {
                score: cosine_similarity(query, &document.embedding),
                document: document.clone(),
            })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        scored
    }

    /// Embed the query text and return the `k` best matches.
    ///
    /// # Errors
    ///
    /// Propagates embedding provider failures.
    pub async fn search<E: EmbeddingProvider>(
        &self,
        provider: &E,
        query: &str,
        k: usize,
    ) -> Result<Vec<Scored>> {
        let query_vector = provider.embed_one(query).await?;
        Ok(self.top_k(&query_vector, k))
    }

    /// Persist the index as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns I/O or serialization errors.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load an index previously written by [`VectorIndex::save`].
    ///
    /// # Errors
    ///
    /// Returns I/O or deserialization errors.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::llms::MockEmbedder;

    fn sample_index() -> VectorIndex {
        let mut index = VectorIndex::new();
        index.insert(Document::new("north", vec![0.0, 1.0]));
        index.insert(Document::new("east", vec![1.0, 0.0]));
        index.insert(Document::new("northeast", vec![0.7, 0.7]));
        index
    }

    #[test]
    fn top_k_ranks_by_similarity() {
        let index = sample_index();
        let hits = index.top_k(&[0.0, 1.0], 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document.text, "north");
        assert_eq!(hits[1].document.text, "northeast");
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn top_k_clamps_to_len() {
        let index = sample_index();
        assert_eq!(index.top_k(&[1.0, 0.0], 10).len(), 3);
    }

    #[test]
    fn top_k_on_empty_index_is_empty() {
        assert!(VectorIndex::new().top_k(&[1.0], 5).is_empty());
    }

    #[tokio::test]
    async fn from_texts_embeds_in_order() {
        let embedder = MockEmbedder::default();
        let index = VectorIndex::from_texts(
            &embedder,
            vec!["louvre".to_owned(), "eiffel tower".to_owned()],
        )
        .await
        .unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.documents()[0].text, "louvre");
    }

    #[tokio::test]
    async fn search_finds_same_text_first() {
        let embedder = MockEmbedder::default();
        let mut index = VectorIndex::new();
        index.insert_text(&embedder, "the louvre museum").await.unwrap();
        index.insert_text(&embedder, "a quiet riverside park").await.unwrap();
        let hits = index.search(&embedder, "the louvre museum", 1).await.unwrap();
        assert_eq!(hits[0].document.text, "the louvre museum");
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        let index = sample_index();
        index.save(&path).unwrap();
        let loaded = VectorIndex::load(&path).unwrap();
        assert_eq!(loaded.len(), index.len());
        assert_eq!(loaded.documents()[0].text, "north");
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = VectorIndex::load("/nonexistent/index.json").unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
    }

    #[test]
    fn metadata_survives_serde() {
        let doc = Document::new("x", vec![1.0])
            .with_metadata(serde_json::json!({"city": "Paris"}));
        let json = serde_json::to_string(&doc).unwrap();
        let back: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(back.metadata["city"], "Paris");
    }
}
