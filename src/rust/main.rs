use anyhow::Context;
use breedscope::server::{self, AppState};
use breedscope::{Classifier, ServerConfig};
use clap::Parser;
use log::info;
use std::time::Instant;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    breedscope::init_logger();
    let config = ServerConfig::parse();

    info!("=== Starting breedscope v{} ===", env!("CARGO_PKG_VERSION"));

    let start_time = Instant::now();
    let store = config.artifact_store();
    info!("Artifact directory: {:?}", store.artifact_dir());

    // Any failure here is fatal: never serve without a model and labels.
    let classifier = Classifier::builder()
        .with_runtime_config(config.runtime_config())
        .with_artifacts(&store, config.model_sha256.as_deref())
        .and_then(|builder| builder.build())
        .context("failed to load model artifacts")?;

    let info = classifier.info();
    info!(
        "=== Classifier ready with {} labels (took {:.2?}) ===",
        info.num_classes,
        start_time.elapsed()
    );
    info!("Labels: {:?}", info.labels.as_slice());

    let app = server::router(AppState::new(classifier, config.status.as_str()), config.body_limit);

    let addr = config.socket_addr().context("invalid listen address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("📡 Server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(server::shutdown_signal())
        .await
        .context("server error")?;

    info!("=== Server stopped ===");
    Ok(())
}
