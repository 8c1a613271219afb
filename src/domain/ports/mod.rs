mod document_source;
mod embedding;
mod vector_store;

pub use document_source::{DocumentSource, RecordStream};
pub use embedding::EmbeddingProvider;
pub use vector_store::VectorStore;
