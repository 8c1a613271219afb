use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::domain::{BulkIndexParams, BulkIndexReport, Document, FieldMapping, Metadata};

#[derive(Debug, Deserialize)]
pub struct IndexRequest {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

fn success() -> Json<SuccessResponse> {
    Json(SuccessResponse { success: true })
}

pub async fn index_document(
    State(state): State<AppState>,
    Json(request): Json<IndexRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let document = Document::new(request.id, request.content).with_metadata(request.metadata);
    state.indexing_service.index_document(&document).await?;
    Ok(success())
}

/// Update shares the indexing upsert path; an id never seen before is
/// simply created.
pub async fn update_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let document = Document::new(id, request.content).with_metadata(request.metadata);
    state.indexing_service.index_document(&document).await?;
    Ok(success())
}

pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.indexing_service.delete_document(&id).await?;
    Ok(success())
}

#[derive(Debug, Deserialize)]
pub struct BulkIndexRequest {
    pub collection_name: String,
    pub aggregation_pipeline: Vec<serde_json::Value>,
    #[serde(default = "default_id_field")]
    pub id_field: String,
    #[serde(default = "default_content_field")]
    pub content_field: String,
    #[serde(default)]
    pub metadata_fields: Vec<String>,
    pub batch_size: Option<usize>,
}

fn default_id_field() -> String {
    "_id".to_string()
}

fn default_content_field() -> String {
    "content".to_string()
}

pub async fn bulk_index(
    State(state): State<AppState>,
    Json(request): Json<BulkIndexRequest>,
) -> Result<Json<BulkIndexReport>, ApiError> {
    let params = BulkIndexParams {
        collection: request.collection_name,
        pipeline: request.aggregation_pipeline,
        mapping: FieldMapping::new(request.id_field, request.content_field)
            .with_metadata_fields(request.metadata_fields),
        batch_size: request.batch_size,
    };

    let report = state.indexing_service.bulk_index(params).await?;
    Ok(Json(report))
}
