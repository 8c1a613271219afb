use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::domain::{Metadata, SearchResult};

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub text: String,
    pub provider: Option<String>,
    pub max_results: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResultResponse>,
}

/// One search hit, flattened for the wire.
#[derive(Debug, Serialize)]
pub struct SearchResultResponse {
    pub id: String,
    pub content: String,
    pub metadata: Metadata,
    pub score: f32,
}

impl From<SearchResult> for SearchResultResponse {
    fn from(result: SearchResult) -> Self {
        Self {
            id: result.document.id,
            content: result.document.content,
            metadata: result.document.metadata,
            score: result.score,
        }
    }
}

pub async fn search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let results = state
        .search_service
        .search(
            &request.text,
            request.provider.as_deref(),
            request.max_results,
        )
        .await?;

    Ok(Json(SearchResponse {
        results: results.into_iter().map(Into::into).collect(),
    }))
}
