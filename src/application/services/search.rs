use std::cmp::Ordering;
use std::sync::Arc;

use tracing::instrument;

use crate::domain::{ports::VectorStore, DomainError, SearchResult};
use crate::infrastructure::ProviderRegistry;

/// Turns natural-language text into a vector query against the store.
pub struct SearchService {
    registry: Arc<ProviderRegistry>,
    vector_store: Arc<dyn VectorStore>,
    max_results: usize,
    similarity_threshold: f32,
}

impl SearchService {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        vector_store: Arc<dyn VectorStore>,
        max_results: usize,
        similarity_threshold: f32,
    ) -> Self {
        Self {
            registry,
            vector_store,
            max_results,
            similarity_threshold,
        }
    }

    #[instrument(skip(self, text))]
    pub async fn search(
        &self,
        text: &str,
        provider: Option<&str>,
        max_results: Option<usize>,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DomainError::validation("Search text must not be empty"));
        }

        let limit = max_results.unwrap_or(self.max_results);
        if limit == 0 {
            return Err(DomainError::validation("max_results must be positive"));
        }

        let provider = self.registry.resolve(provider)?;
        let embedding = provider.embed(text).await?;
        embedding.check_dimension(provider.name(), self.vector_store.vector_size())?;

        let mut results = self
            .vector_store
            .search(&embedding, limit, self.similarity_threshold)
            .await?;

        // Response contract: descending score.
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

        Ok(results)
    }
}
