use anyhow::Context;
use lending_projector::{
    api, config::Config, init_db, ChainReader, EntityDirectory, EventRouter, EventSource,
    InstanceRegistry, JsonlEventSource, Projector, ProjectorSettings, RpcChainReader, Runner,
    SqliteStore, StagedStore, Store, StoreInstanceRegistry,
};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = Config::from_env().context("configuration error")?;
    let port = config.port;

    let pool = init_db(&config.database_path)
        .await
        .with_context(|| format!("failed to initialize database at {}", config.database_path))?;
    let store: Arc<dyn Store> = Arc::new(SqliteStore::new(pool));
    // Replay stages each event's writes; the API reads committed rows only
    let directory = EntityDirectory::new(Arc::new(StagedStore::new(store.clone())));

    let chain: Arc<dyn ChainReader> = Arc::new(RpcChainReader::new(config.rpc_url.clone()));
    let registry: Arc<dyn InstanceRegistry> =
        Arc::new(StoreInstanceRegistry::new(directory.clone()));
    let source: Arc<dyn EventSource> = Arc::new(
        JsonlEventSource::open(&config.events_path)
            .await
            .with_context(|| format!("failed to load events from {}", config.events_path))?,
    );

    let projector = Arc::new(Projector::new(
        directory.clone(),
        chain.clone(),
        registry.clone(),
        ProjectorSettings {
            native_market: config.native_market_address.clone(),
            wrapped_native: config.wrapped_native_address.clone(),
        },
    ));
    let router = EventRouter::new(
        registry,
        config.comptroller_address.clone(),
        config.gauge_controller_address.clone(),
    );
    let runner = Runner::new(source, projector, router, config.batch_size);

    let summary = runner.run_to_end().await.context("projection failed")?;
    tracing::info!(
        processed = summary.processed(),
        last_position = ?summary.last_position.map(|p| p.to_string()),
        "Replay complete"
    );

    let app = api::create_router(api::AppState::new(
        EntityDirectory::new(store),
        chain,
        config.gauge_controller_address.clone(),
    ));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
