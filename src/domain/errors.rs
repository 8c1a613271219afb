use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Provider '{0}' is not enabled")]
    ProviderDisabled(String),

    #[error("Vector size mismatch: provider '{provider}' generated embedding of size {actual}, but vector store expects {expected}")]
    DimensionMismatch {
        provider: String,
        actual: usize,
        expected: usize,
    },

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Document source error: {0}")]
    Source(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::Embedding(msg.into())
    }

    pub fn vector_store(msg: impl Into<String>) -> Self {
        Self::VectorStore(msg.into())
    }

    pub fn source(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_mismatch_names_provider_and_both_sizes() {
        let err = DomainError::DimensionMismatch {
            provider: "ollama".into(),
            actual: 384,
            expected: 768,
        };
        let msg = err.to_string();
        assert!(msg.contains("ollama"));
        assert!(msg.contains("384"));
        assert!(msg.contains("768"));
    }
}
