use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::domain::{errors::DomainError, SourceRecord};

/// Stream of raw records for bulk indexing, already decoded to JSON maps.
pub type RecordStream = BoxStream<'static, Result<SourceRecord, DomainError>>;

/// External database that documents are streamed from during bulk indexing.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Verifies the source is reachable before a bulk run starts.
    async fn ping(&self) -> Result<(), DomainError>;

    /// Runs `pipeline` against `collection` and streams the matching records.
    async fn aggregate(
        &self,
        collection: &str,
        pipeline: &[serde_json::Value],
    ) -> Result<RecordStream, DomainError>;
}
