use crate::domain::{errors::DomainError, Document, Embedding, SearchResult};
use async_trait::async_trait;

/// Nearest-neighbor storage keyed by document id.
///
/// Upserts replace any prior entry with the same id; deletes are no-ops for
/// unknown ids. `vector_size` is the dimensionality the store was created
/// with, which every written or queried vector must match.
#[async_trait]
pub trait VectorStore: Send + Sync {
    fn vector_size(&self) -> usize;

    async fn upsert(&self, document: &Document, embedding: &Embedding) -> Result<(), DomainError>;

    /// Returns up to `limit` entries scoring at or above `score_threshold`,
    /// ordered by descending similarity.
    async fn search(
        &self,
        query: &Embedding,
        limit: usize,
        score_threshold: f32,
    ) -> Result<Vec<SearchResult>, DomainError>;

    async fn delete(&self, id: &str) -> Result<(), DomainError>;

    async fn get(&self, id: &str) -> Result<Option<Document>, DomainError>;
}
