use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::ports::EmbeddingProvider;
use crate::domain::{DomainError, Embedding};
use crate::infrastructure::config::GeminiConfig;

/// Embedding provider for the Google Generative Language API.
///
/// Single texts go through `:embedContent`, batches through
/// `:batchEmbedContents`, both authenticated with the `x-goog-api-key`
/// header.
pub struct GeminiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    vector_size: usize,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct EmbedContentRequest<'a> {
    content: Content<'a>,
}

#[derive(Serialize)]
struct BatchItem<'a> {
    model: String,
    content: Content<'a>,
}

#[derive(Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<BatchItem<'a>>,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    embeddings: Vec<ContentEmbedding>,
}

impl GeminiProvider {
    pub fn new(config: &GeminiConfig) -> Result<Self, DomainError> {
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

    fn content(text: &str) -> Content<'_> {
        Content {
            parts: vec![Part { text }],
        }
    }

    async fn post<Req: Serialize, Resp: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        body: &Req,
    ) -> Result<Resp, DomainError> {
        if self.api_key.is_empty() {
            return Err(DomainError::embedding(
                "Gemini API key is not set. Configure providers.gemini.api_key",
            ));
        }

        let url = format!("{}/models/{}:{}", self.base_url, self.model, method);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| DomainError::embedding(format!("Gemini request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read response body".to_string());
            return Err(DomainError::embedding(format!(
                "Gemini returned {status}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| DomainError::embedding(format!("Invalid Gemini response: {e}")))
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn dimension(&self) -> usize {
        self.vector_size
    }

    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        let request = EmbedContentRequest {
            content: Self::content(text),
        };
        let response: EmbedContentResponse = self.post("embedContent", &request).await?;
        Ok(Embedding::new(response.embedding.values))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| BatchItem {
                    model: format!("models/{}", self.model),
                    content: Self::content(text),
                })
                .collect(),
        };
        let response: BatchEmbedResponse = self.post("batchEmbedContents", &request).await?;

        if response.embeddings.len() != texts.len() {
            return Err(DomainError::embedding(format!(
                "Gemini returned {} embeddings for {} inputs",
                response.embeddings.len(),
                texts.len()
            )));
        }

        Ok(response
            .embeddings
            .into_iter()
            .map(|e| Embedding::new(e.values))
            .collect())
    }
}
