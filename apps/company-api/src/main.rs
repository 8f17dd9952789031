//! Company API - company lifecycle service
//!
//! Stores companies in MongoDB and announces every change on a Kafka topic.

use std::time::Duration;

use anyhow::{Context, Result};
use company_api::{
    auth::TokenVerifier,
    config::{AppConfig, LogFormat},
    routes, AppState,
};
use company_domain::company::{CompanyService, UuidV7Generator};
use company_kafka::KafkaEventPublisher;
use company_mongo::MongoCompanyRepository;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env().context("Failed to load configuration")?;

    init_tracing(config.log_format);
    info!("Starting company API");

    info!(uri = %config.mongo.uri, "Connecting to MongoDB");
    let (client, repository) = MongoCompanyRepository::connect(&config.mongo)
        .await
        .context("Failed to connect to MongoDB")?;
    repository.ping().await.context("MongoDB is not reachable")?;
    repository
        .ensure_indexes()
        .await
        .context("Failed to create MongoDB indexes")?;

    let publisher = KafkaEventPublisher::builder()
        .brokers(config.kafka_broker.clone())
        .timeout(config.publish_timeout)
        .build()
        .context("Failed to create Kafka producer")?;
    info!(brokers = %publisher.brokers(), "Kafka producer ready");

    info!(
        stream = %config.service.stream_name,
        enforce_unique_names = config.service.enforce_unique_names,
        emit_events = config.service.emit_events,
        "Initializing company service"
    );
    let service = CompanyService::new(
        repository,
        publisher.clone(),
        UuidV7Generator,
        config.service.clone(),
    );

    let shutdown = CancellationToken::new();
    let state = AppState::new(
        service,
        TokenVerifier::new(&config.jwt_secret),
        shutdown.clone(),
    );

    // Build HTTP router
    let app = routes::create_router(state);

    let addr = config.bind_address();
    info!(addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    info!("HTTP server stopped, flushing pending events");
    publisher.flush(FLUSH_TIMEOUT);
    client.shutdown().await;
    info!("MongoDB client closed");

    info!("Shutdown complete");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

/// Wait for Ctrl+C or SIGTERM, then cancel in-flight operations
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C signal"),
        () = terminate => info!("Received SIGTERM signal"),
    }

    shutdown.cancel();
}
