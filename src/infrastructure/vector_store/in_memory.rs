use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    derive_point_id, ports::VectorStore, Document, DomainError, Embedding, SearchResult,
};

/// Vector store held entirely in memory. Used by tests and local
/// experiments where no Qdrant instance is available.
pub struct InMemoryVectorStore {
    vector_size: usize,
    points: RwLock<HashMap<Uuid, (Document, Embedding)>>,
}

impl InMemoryVectorStore {
    pub fn new(vector_size: usize) -> Self {
        Self {
            vector_size,
            points: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.points.read().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn vector_size(&self) -> usize {
        self.vector_size
    }

    async fn upsert(&self, document: &Document, embedding: &Embedding) -> Result<(), DomainError> {
        let mut points = self
            .points
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))?;
        points.insert(document.point_id(), (document.clone(), embedding.clone()));
        Ok(())
    }

    async fn search(
        &self,
        query: &Embedding,
        limit: usize,
        score_threshold: f32,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let points = self
            .points
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        let mut results: Vec<SearchResult> = points
            .values()
            .map(|(document, embedding)| SearchResult {
                document: document.clone(),
                score: query.cosine_similarity(embedding),
            })
            .filter(|r| r.score >= score_threshold)
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);

        Ok(results)
    }

    async fn delete(&self, id: &str) -> Result<(), DomainError> {
        let mut points = self
            .points
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))?;
        points.remove(&derive_point_id(id));
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Document>, DomainError> {
        let points = self
            .points
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?;
        Ok(points
            .get(&derive_point_id(id))
            .map(|(document, _)| document.clone()))
    }
}
