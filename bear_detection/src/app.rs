use crate::annotate::Annotator;
use crate::config::Config;
use crate::inference::HttpDetectionClient;
use crate::pipeline::DetectionPipeline;
use crate::server::{HttpServer, SharedState};
use crate::telemetry::Metrics;

use std::{error::Error, sync::Arc};
use tokio::{signal, sync::broadcast};

pub async fn start_app(config: Config) -> Result<(), Box<dyn Error>> {
    let client = match HttpDetectionClient::new(&config.inference) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::error!("Failed to initialize inference client: {:?}", e);
            return Err(Box::new(e));
        }
    };
    tracing::info!(
        "Forwarding detections to {} (timeout {}s)",
        config.inference.url,
        config.inference.timeout_secs
    );

    let annotator = match Annotator::from_config(&config.annotation) {
        Ok(annotator) => annotator,
        Err(e) => {
            tracing::error!("Failed to load label font: {:?}", e);
            return Err(Box::new(e));
        }
    };
    let pipeline = DetectionPipeline::new(client, annotator, config.annotation.jpeg_quality);

    let metrics = match Metrics::new() {
        Ok(metrics) => Arc::new(metrics),
        Err(e) => {
            tracing::error!("Failed to initialize metrics: {:?}", e);
            return Err(e.into());
        }
    };

    let state = SharedState {
        pipeline: Arc::new(pipeline),
        metrics,
    };
    let server = HttpServer::new(state, &config.server).await?;

    let (shutdown_tx, _) = broadcast::channel(1);
    let server_handle = server.run(shutdown_tx.subscribe()).await?;

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown.");

    let _ = shutdown_tx.send(());
    server_handle.await??;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
