use std::sync::Arc;

use crate::application::{IndexingService, SearchService};
use crate::infrastructure::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub search_service: Arc<SearchService>,
    pub indexing_service: Arc<IndexingService>,
}

impl AppState {
    pub fn new(
        config: Arc<AppConfig>,
        search_service: Arc<SearchService>,
        indexing_service: Arc<IndexingService>,
    ) -> Self {
        Self {
            config,
            search_service,
            indexing_service,
        }
    }
}
