use crate::domain::{errors::DomainError, Embedding};
use async_trait::async_trait;

/// One embedding backend (local model server or hosted API).
///
/// `dimension` reports the vector size the backend is configured to produce;
/// callers hold returned embeddings against it before touching the store.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    fn name(&self) -> &str;

    fn dimension(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Embedding, DomainError>;

    /// Embeds several texts in one call where the backend supports it.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, DomainError> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }
}

impl std::fmt::Debug for dyn EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingProvider")
            .field("name", &self.name())
            .field("dimension", &self.dimension())
            .finish()
    }
}
