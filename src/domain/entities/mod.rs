mod bulk;
mod document;
mod embedding;

pub use bulk::{
    extract_document, BulkAccumulator, BulkIndexParams, BulkIndexReport, FieldMapping,
    SourceRecord,
};
pub use document::{derive_point_id, Document, Metadata, SearchResult};
pub use embedding::Embedding;
