use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::ports::EmbeddingProvider;
use crate::domain::{DomainError, Embedding};
use crate::infrastructure::config::OpenAiConfig;

/// Embedding provider for the OpenAI `/embeddings` endpoint. Also works
/// against OpenAI-compatible servers via `base_url`.
pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    vector_size: usize,
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

impl OpenAiProvider {
    pub fn new(config: &OpenAiConfig) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DomainError::internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.embedding_model.clone(),
            vector_size: config.vector_size,
        })
    }

    async fn request(&self, input: &[String]) -> Result<Vec<Embedding>, DomainError> {
        if self.api_key.is_empty() {
            return Err(DomainError::embedding(
                "OpenAI API key is not set. Configure providers.openai.api_key",
            ));
        }

        let url = format!("{}/embeddings", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingsRequest {
                model: &self.model,
                input,
            })
            .send()
            .await
            .map_err(|e| DomainError::embedding(format!("OpenAI request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read response body".to_string());
            return Err(DomainError::embedding(format!(
                "OpenAI returned {status}: {body}"
            )));
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| DomainError::embedding(format!("Invalid OpenAI response: {e}")))?;

        if parsed.data.len() != input.len() {
            return Err(DomainError::embedding(format!(
                "OpenAI returned {} embeddings for {} inputs",
                parsed.data.len(),
                input.len()
            )));
        }

        // The API does not guarantee response order.
        let mut data = parsed.data;
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| Embedding::new(d.embedding)).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn dimension(&self) -> usize {
        self.vector_size
    }

    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        let input = [text.to_string()];
        let mut embeddings = self.request(&input).await?;
        embeddings
            .pop()
            .ok_or_else(|| DomainError::embedding("OpenAI returned an empty embedding list"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts).await
    }
}
