//! Semantic search over a vector store, fronted by a small REST API.
//!
//! Natural-language text is embedded by a configurable provider (Ollama,
//! OpenAI, or Gemini), stored in Qdrant, and queried by cosine similarity.
//! Bulk loads stream documents out of MongoDB aggregation pipelines.

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;
