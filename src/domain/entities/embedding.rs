use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Fixed-length vector produced by an embedding provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding(pub Vec<f32>);

impl Embedding {
    pub fn new(vec: Vec<f32>) -> Self {
        Self(vec)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }

    /// Rejects vectors whose size disagrees with the store's configured
    /// dimension. Vectors are never truncated or padded to fit.
    pub fn check_dimension(&self, provider: &str, expected: usize) -> Result<(), DomainError> {
        if self.0.len() != expected {
            return Err(DomainError::DimensionMismatch {
                provider: provider.to_string(),
                actual: self.0.len(),
                expected,
            });
        }
        Ok(())
    }

    /// Mismatched lengths and zero vectors score 0 rather than erroring;
    /// the in-memory store relies on that for ranking.
    pub fn cosine_similarity(&self, other: &Embedding) -> f32 {
        if self.0.len() != other.0.len() {
            return 0.0;
        }

        let mut dot = 0.0f32;
        let mut norm_a = 0.0f32;
        let mut norm_b = 0.0f32;
        for (a, b) in self.0.iter().zip(other.0.iter()) {
            dot += a * b;
            norm_a += a * a;
            norm_b += b * b;
        }

        let denominator = (norm_a * norm_b).sqrt();
        if denominator == 0.0 {
            return 0.0;
        }
        dot / denominator
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(vec: Vec<f32>) -> Self {
        Self(vec)
    }
}

impl AsRef<[f32]> for Embedding {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}
