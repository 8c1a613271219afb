use std::sync::Arc;

use semantic_search::api::{create_router, AppState};
use semantic_search::application::{IndexingService, SearchService};
use semantic_search::infrastructure::{
    AppConfig, MongoDocumentSource, ProviderRegistry, QdrantVectorStore,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "api=debug,semantic_search=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Arc::new(AppConfig::load()?);
    let vector_size = config.vector_size()?;

    let registry = Arc::new(ProviderRegistry::from_config(&config)?);
    info!(
        providers = ?registry.names(),
        default = registry.default_provider(),
        "Embedding providers ready"
    );

    let vector_store = Arc::new(
        QdrantVectorStore::new(
            &config.vector_db.url(),
            &config.vector_db.collection_name,
            vector_size,
        )
        .await?,
    );
    info!(
        collection = %config.vector_db.collection_name,
        size = vector_size,
        "Vector store ready"
    );

    // The MongoDB client dials lazily; bulk requests ping before streaming.
    let source = Arc::new(
        MongoDocumentSource::connect(&config.mongodb.uri, &config.mongodb.database).await?,
    );

    let search_service = Arc::new(SearchService::new(
        registry.clone(),
        vector_store.clone(),
        config.search.max_results,
        config.search.similarity_threshold,
    ));
    let indexing_service = Arc::new(IndexingService::new(
        registry,
        vector_store,
        source,
        config.indexing.batch_size,
    ));

    let state = AppState::new(config.clone(), search_service, indexing_service);
    let app = create_router(state);

    let addr = config.server.bind_address();
    info!("API server listening on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
