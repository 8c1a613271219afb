pub mod entities;
pub mod errors;
pub mod ports;

pub use entities::{
    derive_point_id, extract_document, BulkAccumulator, BulkIndexParams, BulkIndexReport,
    Document, Embedding, FieldMapping, Metadata, SearchResult, SourceRecord,
};
pub use errors::{DomainError, Result};
