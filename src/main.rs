//! Demo binary: wires the pipeline with stub detection/translation backends
//! and runs until interrupted. Real deployments provide their own
//! `TextDetector`, `EngineProvider`, and `CaptureControl` implementations.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use lingolens::translate::remote::HttpRemoteClient;
use lingolens::{
    load_config, MemoryHistory, NoopCapture, PipelineConfig, PipelineController, PipelineDeps,
    StubDetector, StubEngineProvider,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lingolens=debug".parse().unwrap()),
        )
        .with_target(true)
        .init();

    info!("lingolens starting");

    let config_path = Path::new("lingolens.toml");
    let config = if config_path.exists() {
        match load_config(config_path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "config load failed, using defaults");
                PipelineConfig::default()
            }
        }
    } else {
        PipelineConfig::default()
    };

    let remote = match HttpRemoteClient::new(config.remote.endpoint.clone(), config.remote_timeout())
    {
        Ok(client) => Arc::new(client),
        Err(e) => {
            eprintln!("failed to build remote client: {e}");
            std::process::exit(1);
        }
    };

    let controller = PipelineController::spawn(
        &config,
        PipelineDeps {
            detector: Arc::new(StubDetector),
            engines: Box::new(StubEngineProvider),
            remote,
            capture: Arc::new(NoopCapture),
            history: Some(Arc::new(MemoryHistory::new())),
        },
    );

    info!(languages = %controller.languages(), "pipeline ready, ctrl-c to stop");
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "signal listener failed");
    }

    controller.shutdown();
    for (name, summary) in controller.metrics().summary() {
        info!(
            metric = %name,
            count = summary.count,
            p50_us = summary.p50_us,
            p95_us = summary.p95_us,
            "timing summary"
        );
    }
    info!("lingolens stopped");
}
