use std::sync::Arc;
use std::time::Instant;

use futures::StreamExt;
use tracing::instrument;

use crate::domain::ports::{DocumentSource, EmbeddingProvider, VectorStore};
use crate::domain::{
    extract_document, BulkAccumulator, BulkIndexParams, BulkIndexReport, Document, DomainError,
};
use crate::infrastructure::ProviderRegistry;

/// Indexes documents one at a time or in bulk from the document source.
///
/// All indexing embeds with the configured default provider, so every
/// stored vector matches the collection dimension.
pub struct IndexingService {
    registry: Arc<ProviderRegistry>,
    vector_store: Arc<dyn VectorStore>,
    source: Arc<dyn DocumentSource>,
    batch_size: usize,
}

impl IndexingService {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        vector_store: Arc<dyn VectorStore>,
        source: Arc<dyn DocumentSource>,
        batch_size: usize,
    ) -> Self {
        Self {
            registry,
            vector_store,
            source,
            batch_size,
        }
    }

    #[instrument(skip(self, document), fields(id = %document.id))]
    pub async fn index_document(&self, document: &Document) -> Result<(), DomainError> {
        if document.id.trim().is_empty() {
            return Err(DomainError::validation("Document id must not be empty"));
        }
        if document.content.trim().is_empty() {
            return Err(DomainError::validation("Document content must not be empty"));
        }

        let provider = self.registry.resolve(None)?;
        let embedding = provider.embed(&document.content).await?;
        embedding.check_dimension(provider.name(), self.vector_store.vector_size())?;

        self.vector_store.upsert(document, &embedding).await
    }

    /// Removing an id that was never indexed is a no-op, not an error.
    #[instrument(skip(self))]
    pub async fn delete_document(&self, id: &str) -> Result<(), DomainError> {
        if id.trim().is_empty() {
            return Err(DomainError::validation("Document id must not be empty"));
        }
        self.vector_store.delete(id).await
    }

    #[instrument(skip(self, params), fields(collection = %params.collection))]
    pub async fn bulk_index(
        &self,
        params: BulkIndexParams,
    ) -> Result<BulkIndexReport, DomainError> {
        let batch_size = params.batch_size.unwrap_or(self.batch_size);
        if batch_size == 0 {
            return Err(DomainError::validation("batch_size must be positive"));
        }

        let provider = self.registry.resolve(None)?;
        self.source.ping().await?;

        let started = Instant::now();
        let mut stream = self
            .source
            .aggregate(&params.collection, &params.pipeline)
            .await?;

        let mut accumulator = BulkAccumulator::new();
        let mut buffer: Vec<Document> = Vec::with_capacity(batch_size);

        while let Some(record) = stream.next().await {
            match record {
                Ok(record) => match extract_document(&record, &params.mapping) {
                    Ok(document) => {
                        buffer.push(document);
                        if buffer.len() >= batch_size {
                            self.flush(provider.as_ref(), &mut buffer, &mut accumulator)
                                .await;
                            let elapsed = started.elapsed().as_secs_f64();
                            let rate = if elapsed > 0.0 {
                                accumulator.indexed() as f64 / elapsed
                            } else {
                                0.0
                            };
                            tracing::info!(
                                indexed = accumulator.indexed(),
                                errors = accumulator.error_count(),
                                rate,
                                "Bulk indexing progress"
                            );
                        }
                    }
                    Err(message) => accumulator.record_error(message),
                },
                Err(e) => accumulator.record_error(format!("source error: {e}")),
            }
        }

        self.flush(provider.as_ref(), &mut buffer, &mut accumulator)
            .await;

        let report = accumulator.into_report(started.elapsed());
        tracing::info!(
            indexed = report.indexed_count,
            errors = report.error_count,
            elapsed = report.elapsed_time,
            "Bulk indexing finished"
        );
        Ok(report)
    }

    /// Embeds and upserts everything buffered so far. Failures are recorded
    /// per document; nothing here aborts the run.
    async fn flush(
        &self,
        provider: &dyn EmbeddingProvider,
        buffer: &mut Vec<Document>,
        accumulator: &mut BulkAccumulator,
    ) {
        if buffer.is_empty() {
            return;
        }

        let documents: Vec<Document> = buffer.drain(..).collect();
        let texts: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();

        let embeddings = match provider.embed_batch(&texts).await {
            Ok(embeddings) if embeddings.len() == documents.len() => embeddings,
            Ok(embeddings) => {
                for document in &documents {
                    accumulator.record_error(format!(
                        "record '{}': provider returned {} embeddings for {} inputs",
                        document.id,
                        embeddings.len(),
                        documents.len()
                    ));
                }
                return;
            }
            Err(e) => {
                for document in &documents {
                    accumulator.record_error(format!("record '{}': {e}", document.id));
                }
                return;
            }
        };

        let expected = self.vector_store.vector_size();
        for (document, embedding) in documents.iter().zip(embeddings) {
            if let Err(e) = embedding.check_dimension(provider.name(), expected) {
                accumulator.record_error(format!("record '{}': {e}", document.id));
                continue;
            }
            match self.vector_store.upsert(document, &embedding).await {
                Ok(()) => accumulator.record_indexed(),
                Err(e) => accumulator.record_error(format!("record '{}': {e}", document.id)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use futures::stream;
    use serde_json::json;

    use crate::domain::ports::RecordStream;
    use crate::domain::{Embedding, FieldMapping, SourceRecord};
    use crate::infrastructure::InMemoryVectorStore;

    struct ConstantProvider {
        dimension: usize,
        batch_calls: AtomicUsize,
        fail: bool,
    }

    impl ConstantProvider {
        fn new(dimension: usize) -> Self {
            Self {
                dimension,
                batch_calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing(dimension: usize) -> Self {
            Self {
                fail: true,
                ..Self::new(dimension)
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for ConstantProvider {
        fn name(&self) -> &str {
            "fake"
        }

        fn dimension(&self) -> usize {
            self.dimension
        }

        async fn embed(&self, _text: &str) -> Result<Embedding, DomainError> {
            if self.fail {
                return Err(DomainError::embedding("provider unavailable"));
            }
            let mut vector = vec![0.0; self.dimension];
            vector[0] = 1.0;
            Ok(Embedding::new(vector))
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, DomainError> {
            self.batch_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DomainError::embedding("provider unavailable"));
            }
            let mut embeddings = Vec::with_capacity(texts.len());
            for text in texts {
                embeddings.push(self.embed(text).await?);
            }
            Ok(embeddings)
        }
    }

    struct FakeSource {
        reachable: bool,
        records: Mutex<Vec<Result<SourceRecord, DomainError>>>,
    }

    impl FakeSource {
        fn new(records: Vec<Result<SourceRecord, DomainError>>) -> Self {
            Self {
                reachable: true,
                records: Mutex::new(records),
            }
        }

        fn unreachable() -> Self {
            Self {
                reachable: false,
                records: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl DocumentSource for FakeSource {
        async fn ping(&self) -> Result<(), DomainError> {
            if self.reachable {
                Ok(())
            } else {
                Err(DomainError::source("connection refused"))
            }
        }

        async fn aggregate(
            &self,
            _collection: &str,
            _pipeline: &[serde_json::Value],
        ) -> Result<RecordStream, DomainError> {
            let records = std::mem::take(&mut *self.records.lock().unwrap());
            Ok(Box::pin(stream::iter(records)))
        }
    }

    fn record(value: serde_json::Value) -> Result<SourceRecord, DomainError> {
        Ok(value.as_object().unwrap().clone())
    }

    fn service(
        provider: Arc<ConstantProvider>,
        source: Arc<FakeSource>,
        store: Arc<InMemoryVectorStore>,
        batch_size: usize,
    ) -> IndexingService {
        let mut registry = ProviderRegistry::new("fake");
        registry.register(provider);
        IndexingService::new(Arc::new(registry), store, source, batch_size)
    }

    fn params(batch_size: Option<usize>) -> BulkIndexParams {
        BulkIndexParams {
            collection: "listings".to_string(),
            pipeline: vec![json!({"$match": {}})],
            mapping: FieldMapping::new("_id", "content")
                .with_metadata_fields(vec!["city".to_string()]),
            batch_size,
        }
    }

    #[tokio::test]
    async fn index_document_upserts_and_overwrites_by_id() {
        let store = Arc::new(InMemoryVectorStore::new(3));
        let svc = service(
            Arc::new(ConstantProvider::new(3)),
            Arc::new(FakeSource::new(Vec::new())),
            store.clone(),
            10,
        );

        svc.index_document(&Document::new("doc1", "first"))
            .await
            .unwrap();
        svc.index_document(&Document::new("doc1", "second"))
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("doc1").await.unwrap().unwrap().content, "second");
    }

    #[tokio::test]
    async fn blank_id_or_content_is_rejected_before_any_call() {
        let store = Arc::new(InMemoryVectorStore::new(3));
        let svc = service(
            Arc::new(ConstantProvider::new(3)),
            Arc::new(FakeSource::new(Vec::new())),
            store.clone(),
            10,
        );

        let err = svc
            .index_document(&Document::new("doc1", "   "))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = svc
            .index_document(&Document::new("", "text"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn index_rejects_mismatched_vector_sizes() {
        let store = Arc::new(InMemoryVectorStore::new(3));
        let svc = service(
            Arc::new(ConstantProvider::new(2)),
            Arc::new(FakeSource::new(Vec::new())),
            store.clone(),
            10,
        );

        let err = svc
            .index_document(&Document::new("doc1", "text"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::DimensionMismatch {
                actual: 2,
                expected: 3,
                ..
            }
        ));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn delete_succeeds_for_missing_ids() {
        let store = Arc::new(InMemoryVectorStore::new(3));
        let svc = service(
            Arc::new(ConstantProvider::new(3)),
            Arc::new(FakeSource::new(Vec::new())),
            store.clone(),
            10,
        );

        svc.index_document(&Document::new("doc1", "text"))
            .await
            .unwrap();
        svc.delete_document("doc1").await.unwrap();
        svc.delete_document("doc1").await.unwrap();

        assert!(store.get("doc1").await.unwrap().is_none());

        let err = svc.delete_document("  ").await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn bulk_index_reports_successes_and_isolated_failures() {
        let store = Arc::new(InMemoryVectorStore::new(3));
        let source = Arc::new(FakeSource::new(vec![
            record(json!({"_id": "a1", "content": "first doc", "city": "Porto"})),
            record(json!({"_id": "a2", "title": "content missing"})),
            record(json!({"_id": "a3", "content": "third doc"})),
        ]));
        let svc = service(Arc::new(ConstantProvider::new(3)), source, store.clone(), 2);

        let report = svc.bulk_index(params(None)).await.unwrap();

        assert_eq!(report.indexed_count, 2);
        assert_eq!(report.error_count, 1);
        assert!(report.errors[0].contains("a2"));
        assert!(report.errors[0].contains("content"));
        assert!(report.elapsed_time >= 0.0);

        assert_eq!(store.len(), 2);
        let doc = store.get("a1").await.unwrap().unwrap();
        assert_eq!(doc.metadata["city"], json!("Porto"));
        assert!(store.get("a2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn bulk_index_continues_past_source_errors() {
        let store = Arc::new(InMemoryVectorStore::new(3));
        let source = Arc::new(FakeSource::new(vec![
            record(json!({"_id": "a1", "content": "first"})),
            Err(DomainError::source("Cursor error: connection reset")),
            record(json!({"_id": "a2", "content": "second"})),
        ]));
        let svc = service(Arc::new(ConstantProvider::new(3)), source, store.clone(), 10);

        let report = svc.bulk_index(params(None)).await.unwrap();

        assert_eq!(report.indexed_count, 2);
        assert_eq!(report.error_count, 1);
        assert!(report.errors[0].contains("source error"));
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn wholesale_embed_failure_marks_every_buffered_record() {
        let store = Arc::new(InMemoryVectorStore::new(3));
        let source = Arc::new(FakeSource::new(vec![
            record(json!({"_id": "a1", "content": "first"})),
            record(json!({"_id": "a2", "content": "second"})),
            record(json!({"_id": "a3", "content": "third"})),
        ]));
        let svc = service(
            Arc::new(ConstantProvider::failing(3)),
            source,
            store.clone(),
            2,
        );

        let report = svc.bulk_index(params(None)).await.unwrap();

        assert_eq!(report.indexed_count, 0);
        assert_eq!(report.error_count, 3);
        assert!(report.errors.iter().all(|e| e.contains("provider unavailable")));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn bulk_index_flushes_per_batch() {
        let provider = Arc::new(ConstantProvider::new(3));
        let store = Arc::new(InMemoryVectorStore::new(3));
        let source = Arc::new(FakeSource::new(
            (0..5)
                .map(|i| record(json!({"_id": format!("r{i}"), "content": "text"})))
                .collect(),
        ));
        let svc = service(provider.clone(), source, store.clone(), 10);

        let report = svc.bulk_index(params(Some(2))).await.unwrap();

        assert_eq!(report.indexed_count, 5);
        assert_eq!(provider.batch_calls.load(Ordering::SeqCst), 3);
        assert_eq!(store.len(), 5);
    }

    #[tokio::test]
    async fn unreachable_source_fails_the_whole_request() {
        let provider = Arc::new(ConstantProvider::new(3));
        let store = Arc::new(InMemoryVectorStore::new(3));
        let svc = service(
            provider.clone(),
            Arc::new(FakeSource::unreachable()),
            store,
            10,
        );

        let err = svc.bulk_index(params(None)).await.unwrap_err();
        assert!(matches!(err, DomainError::Source(_)));
        assert_eq!(provider.batch_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn zero_batch_size_is_rejected() {
        let store = Arc::new(InMemoryVectorStore::new(3));
        let svc = service(
            Arc::new(ConstantProvider::new(3)),
            Arc::new(FakeSource::new(Vec::new())),
            store,
            10,
        );

        let err = svc.bulk_index(params(Some(0))).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
