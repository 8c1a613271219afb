pub mod config;
pub mod providers;
pub mod source;
pub mod vector_store;

pub use config::AppConfig;
pub use providers::ProviderRegistry;
pub use source::MongoDocumentSource;
pub use vector_store::{InMemoryVectorStore, QdrantVectorStore};
