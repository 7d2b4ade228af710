//! TextServe
//!
//! Serves label predictions from a fitted count vectorizer and classifier.

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use std::net::SocketAddr;
use std::path::Path;
use textserve_classifiers::{pack_json, ArtifactKind};
use textserve_server::cli::{Cli, Commands, ServeArgs};
use textserve_server::{run_server, AppState, ServerConfig};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => serve(args).await,
        Commands::Pack {
            kind,
            input,
            output,
            verbose,
        } => {
            init_tracing(verbose, false);
            pack(kind, &input, &output)
        }
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    init_tracing(args.verbose, args.log_json);

    info!("Starting TextServe");

    // Load configuration
    let config = ServerConfig::load(&args.config, &args)
        .with_context(|| format!("Failed to load configuration from {}", args.config))?;
    info!("Configuration loaded successfully");
    info!("Strategy: {:?}", config.artifacts.strategy);
    info!("Model path: {}", config.artifacts.model_path.display());
    info!("Vectorizer path: {}", config.artifacts.vectorizer_path.display());

    // Initialize metrics
    let metrics_handle = init_metrics()?;

    // Load the model before accepting traffic
    let state = AppState::initialize(config, Some(metrics_handle)).await;
    if !state.model.is_loaded() {
        warn!("Serving without a model; /predict will be refused");
    }

    let addr: SocketAddr = format!("{}:{}", args.listen, args.port).parse()?;
    run_server(state, addr).await
}

fn pack(kind: ArtifactKind, input: &Path, output: &Path) -> Result<()> {
    let json = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let bytes = pack_json(kind, &json)?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output, &bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!(
        "Wrote {:?} artifact to {} ({} bytes)",
        kind,
        output.display(),
        bytes.len()
    );
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool, json: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("textserve=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("textserve=info"))
    };

    let (plain, json) = if json {
        (None, Some(fmt::layer().json()))
    } else {
        (Some(fmt::layer()), None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(plain)
        .with(json)
        .init();
}

/// Initialize metrics exporter and return handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(
        "textserve_predictions_total",
        "Total number of prediction requests by outcome"
    );
    metrics::describe_histogram!(
        "textserve_prediction_latency_us",
        metrics::Unit::Microseconds,
        "Vectorize + predict latency in microseconds"
    );
    metrics::describe_counter!(
        "textserve_artifact_fetches_total",
        "Artifact downloads by outcome"
    );

    info!("Metrics exporter initialized");
    Ok(handle)
}
