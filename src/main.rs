use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nutriscore_api::config::Config;
use nutriscore_api::forest::load_model;
use nutriscore_api::handlers::{self, AppState};
use nutriscore_api::predictor::ScorePredictor;
use nutriscore_api::product_client::ProductClient;
use nutriscore_api::scoring::self_check;

/// Sets up stdout logging, plus a plain-text file log when `LOG_FILE` is set.
///
/// The returned guard flushes the file writer on drop and must outlive the server.
fn init_tracing() -> anyhow::Result<Option<WorkerGuard>> {
    let (file_layer, guard) = match std::env::var("LOG_FILE")
        .ok()
        .filter(|s| !s.trim().is_empty())
    {
        Some(log_file) => {
            let path = std::path::Path::new(&log_file);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("LOG_FILE must name a file"))?;
            std::fs::create_dir_all(dir)?;

            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nutriscore_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    Ok(guard)
}

/// Main entry point for the application.
///
/// Loads configuration and the model, verifies the model end-to-end with the
/// health-check inputs, then serves the API. A model that fails to load or
/// score aborts startup.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let _log_guard = init_tracing()?;

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    let package = load_model(&config.model_path, config.model_sha256.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to load model from {}: {}", config.model_path, e))?;
    let predictor = ScorePredictor::from_package(package)?;
    let baseline = self_check(&predictor)
        .map_err(|e| anyhow::anyhow!("Model failed self-check: {}", e))?;
    tracing::info!(
        "Successfully loaded model {} (self-check score {:.2})",
        predictor.metadata().version,
        baseline
    );

    let products = ProductClient::new(&config)?;
    tracing::info!(
        "Product client initialized: {} (timeout {}s, cache TTL {}s)",
        config.product_api_base_url,
        config.product_api_timeout_secs,
        config.product_cache_ttl_secs
    );

    let app_state = Arc::new(AppState {
        predictor,
        products,
    });

    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(config.rate_limit_interval_ms())
            .burst_size(config.rate_limit_burst)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limit configuration"))?,
    );

    let protected_routes = handlers::api_routes().layer(GovernorLayer {
        config: governor_conf,
    });

    // Health check bypasses rate limiting
    let app = Router::new()
        .merge(handlers::health_routes())
        .merge(protected_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
