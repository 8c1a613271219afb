use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::ports::EmbeddingProvider;
use crate::domain::{DomainError, Embedding};
use crate::infrastructure::config::OllamaConfig;

/// Embedding provider backed by a local Ollama instance.
///
/// Uses the `/api/embed` endpoint, which accepts a list of inputs and
/// returns one embedding per input in the same order.
pub struct OllamaProvider {
    client: reqwest::Client,
    url: String,
    model: String,
    vector_size: usize,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaProvider {
    pub fn new(config: &OllamaConfig) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DomainError::internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: config.url.trim_end_matches('/').to_string(),
            model: config.embedding_model.clone(),
            vector_size: config.vector_size,
        })
    }

    async fn request(&self, input: &[String]) -> Result<Vec<Embedding>, DomainError> {
        let url = format!("{}/api/embed", self.url);
        let response = self
            .client
            .post(&url)
            .json(&EmbedRequest {
                model: &self.model,
                input,
            })
            .send()
            .await
            .map_err(|e| DomainError::embedding(format!("Ollama request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read response body".to_string());
            return Err(DomainError::embedding(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| DomainError::embedding(format!("Invalid Ollama response: {e}")))?;

        if parsed.embeddings.len() != input.len() {
            return Err(DomainError::embedding(format!(
                "Ollama returned {} embeddings for {} inputs",
                parsed.embeddings.len(),
                input.len()
            )));
        }

        Ok(parsed.embeddings.into_iter().map(Embedding::new).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn dimension(&self) -> usize {
        self.vector_size
    }

    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        let input = [text.to_string()];
        let mut embeddings = self.request(&input).await?;
        embeddings
            .pop()
            .ok_or_else(|| DomainError::embedding("Ollama returned an empty embedding list"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts).await
    }
}
