//! Invoice Server
//!
//! Upload PDF invoices, extract their fields with a language model, review
//! and store the results.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use invoice_server::config::StorageBackend;
use invoice_server::normalize::{GeminiModel, NormalizeError, Normalizer};
use invoice_server::pdf::TextExtractor;
use invoice_server::pipeline::ExtractionPipeline;
use invoice_server::storage::{BlobStore, LocalBlobStore, S3BlobStore};
use invoice_server::{build_router, db, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before reading RUST_LOG
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "invoice_server=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Invalid configuration")?;

    tracing::info!(
        environment = ?config.environment,
        "Starting Invoice Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Blob storage
    let blobs: Arc<dyn BlobStore> = match config.storage.backend {
        StorageBackend::Local => {
            let store = LocalBlobStore::new(&config.storage.path);
            store.init().await.context("Failed to create storage directory")?;
            tracing::info!(path = %config.storage.path, "Using local blob storage");
            Arc::new(store)
        }
        StorageBackend::S3 => {
            let s3 = config
                .storage
                .s3
                .as_ref()
                .context("STORAGE_BACKEND=s3 requires S3 settings")?;
            tracing::info!(endpoint = %s3.endpoint, bucket = %s3.bucket, "Using S3 blob storage");
            Arc::new(S3BlobStore::new(s3).await)
        }
    };

    // Database
    let db_pool = db::create_pool(&config.database)
        .await
        .context("Failed to initialize database")?;

    // Language model
    let normalizer = match GeminiModel::new(&config.model) {
        Ok(model) => {
            tracing::info!(model = %config.model.model, "Language model client ready");
            Normalizer::new(Arc::new(model))
        }
        Err(NormalizeError::MissingApiKey) => {
            tracing::warn!("GEMINI_API_KEY is not set; extraction requests will fail until it is configured");
            Normalizer::unconfigured()
        }
        Err(e) => return Err(e).context("Failed to build language model client"),
    };

    if config.extraction.sample_fallback {
        tracing::warn!("EXTRACT_SAMPLE_FALLBACK is on: unreadable PDFs are replaced with a canned sample invoice");
    }

    let pipeline = ExtractionPipeline::new(
        blobs.clone(),
        TextExtractor::new(config.extraction.limits()),
        normalizer,
    )
    .with_sample_fallback(config.extraction.sample_fallback);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid SERVER_HOST or SERVER_PORT")?;

    let app_state = AppState::new(config, blobs, db_pool.clone(), pipeline);
    let app = build_router(app_state);

    // Start server with graceful shutdown
    tracing::info!("Invoice Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    db_pool.close().await;
    tracing::info!("Server shutdown complete");

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
