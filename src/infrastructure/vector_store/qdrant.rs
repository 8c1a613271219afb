use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::qdrant::{
    value::Kind, vectors_config, CreateCollectionBuilder, DeletePointsBuilder, Distance,
    GetPointsBuilder, PointId, PointStruct, PointsIdsList, SearchPointsBuilder,
    UpsertPointsBuilder, Value, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};

use crate::domain::{
    derive_point_id, ports::VectorStore, Document, DomainError, Embedding, Metadata, SearchResult,
};

/// Vector store backed by a Qdrant collection with cosine distance.
///
/// Points are keyed by the UUID derived from the caller-supplied document
/// id; the original id, the content and the metadata live in the payload.
pub struct QdrantVectorStore {
    client: Qdrant,
    collection: String,
    vector_size: usize,
}

impl QdrantVectorStore {
    pub async fn new(
        url: &str,
        collection: &str,
        vector_size: usize,
    ) -> Result<Self, DomainError> {
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| DomainError::vector_store(e.to_string()))?;

        let store = Self {
            client,
            collection: collection.to_string(),
            vector_size,
        };

        store.ensure_collection().await?;

        Ok(store)
    }

    async fn ensure_collection(&self) -> Result<(), DomainError> {
        let collections = self
            .client
            .list_collections()
            .await
            .map_err(|e| DomainError::vector_store(e.to_string()))?;

        let exists = collections
            .collections
            .iter()
            .any(|c| c.name == self.collection);

        if !exists {
            tracing::info!(
                collection = %self.collection,
                size = self.vector_size,
                "Creating Qdrant collection"
            );
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.collection).vectors_config(
                        VectorParamsBuilder::new(self.vector_size as u64, Distance::Cosine),
                    ),
                )
                .await
                .map_err(|e| DomainError::vector_store(e.to_string()))?;
            return Ok(());
        }

        // Refuse to serve a collection whose dimension disagrees with the
        // default provider; silently recreating it would drop data.
        if let Some(size) = self.existing_vector_size().await? {
            if size != self.vector_size as u64 {
                return Err(DomainError::config(format!(
                    "Collection '{}' stores vectors of size {}, but the default provider produces size {}",
                    self.collection, size, self.vector_size
                )));
            }
        }

        Ok(())
    }

    async fn existing_vector_size(&self) -> Result<Option<u64>, DomainError> {
        let info = self
            .client
            .collection_info(&self.collection)
            .await
            .map_err(|e| DomainError::vector_store(e.to_string()))?;

        Ok(info
            .result
            .and_then(|r| r.config)
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|v| v.config)
            .and_then(|c| match c {
                vectors_config::Config::Params(params) => Some(params.size),
                vectors_config::Config::ParamsMap(_) => None,
            }))
    }

    fn point_id_for(id: &str) -> PointId {
        PointId::from(derive_point_id(id).to_string())
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    fn vector_size(&self) -> usize {
        self.vector_size
    }

    async fn upsert(&self, document: &Document, embedding: &Embedding) -> Result<(), DomainError> {
        let payload: Payload = serde_json::json!({
            "id": document.id,
            "content": document.content,
            "metadata": document.metadata,
        })
        .try_into()
        .map_err(|_| DomainError::internal("Failed to create payload"))?;

        let point = PointStruct::new(
            document.point_id().to_string(),
            embedding.as_slice().to_vec(),
            payload,
        );

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, vec![point]).wait(true))
            .await
            .map_err(|e| DomainError::vector_store(e.to_string()))?;

        Ok(())
    }

    async fn search(
        &self,
        query: &Embedding,
        limit: usize,
        score_threshold: f32,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let results = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, query.as_slice().to_vec(), limit as u64)
                    .with_payload(true)
                    .score_threshold(score_threshold),
            )
            .await
            .map_err(|e| DomainError::vector_store(e.to_string()))?;

        Ok(results
            .result
            .into_iter()
            .filter_map(|point| {
                let document = document_from_payload(point.payload)?;
                Some(SearchResult {
                    document,
                    score: point.score,
                })
            })
            .collect())
    }

    async fn delete(&self, id: &str) -> Result<(), DomainError> {
        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.collection)
                    .points(PointsIdsList {
                        ids: vec![Self::point_id_for(id)],
                    })
                    .wait(true),
            )
            .await
            .map_err(|e| DomainError::vector_store(e.to_string()))?;

        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Document>, DomainError> {
        let response = self
            .client
            .get_points(
                GetPointsBuilder::new(&self.collection, vec![Self::point_id_for(id)])
                    .with_payload(true),
            )
            .await
            .map_err(|e| DomainError::vector_store(e.to_string()))?;

        Ok(response
            .result
            .into_iter()
            .next()
            .and_then(|point| document_from_payload(point.payload)))
    }
}

fn document_from_payload(mut payload: HashMap<String, Value>) -> Option<Document> {
    let id = payload.get("id")?.as_str()?.to_string();
    let content = payload.get("content")?.as_str()?.to_string();
    let metadata = match payload.remove("metadata").map(value_to_json) {
        Some(serde_json::Value::Object(map)) => map,
        _ => Metadata::new(),
    };
    Some(Document {
        id,
        content,
        metadata,
    })
}

fn value_to_json(value: Value) -> serde_json::Value {
    match value.kind {
        Some(Kind::BoolValue(b)) => serde_json::Value::Bool(b),
        Some(Kind::IntegerValue(i)) => serde_json::Value::from(i),
        Some(Kind::DoubleValue(f)) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Some(Kind::StringValue(s)) => serde_json::Value::String(s),
        Some(Kind::ListValue(list)) => {
            serde_json::Value::Array(list.values.into_iter().map(value_to_json).collect())
        }
        Some(Kind::StructValue(fields)) => serde_json::Value::Object(
            fields
                .fields
                .into_iter()
                .map(|(k, v)| (k, value_to_json(v)))
                .collect(),
        ),
        Some(Kind::NullValue(_)) | None => serde_json::Value::Null,
    }
}
