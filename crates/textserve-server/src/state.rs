//! Shared application state

use crate::config::ServerConfig;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use textserve_classifiers::{ArtifactFetcher, ModelLoader, ModelStatus};
use tracing::{error, info};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<ServerConfig>,

    /// Startup load outcome, immutable for the life of the process
    pub model: Arc<ModelStatus>,

    /// Loader for the configured sources; `None` when the config could not produce one
    pub loader: Option<Arc<ModelLoader>>,

    /// Prometheus metrics handle for rendering
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    /// Build state from already-resolved parts
    pub fn new(
        config: ServerConfig,
        model: ModelStatus,
        loader: Option<ModelLoader>,
        metrics_handle: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            model: Arc::new(model),
            loader: loader.map(Arc::new),
            metrics_handle,
        }
    }

    /// Resolve sources and load the model once.
    ///
    /// Never fails: any configuration or loading error leaves the model
    /// unavailable so the diagnostic routes still come up.
    pub async fn initialize(config: ServerConfig, metrics_handle: Option<PrometheusHandle>) -> Self {
        info!(
            "Initializing application state ({:?} strategy)",
            config.artifacts.strategy
        );

        let (model, loader) = match build_loader(&config) {
            Ok(loader) => (loader.load_status().await, Some(loader)),
            Err(e) => {
                error!("Artifact configuration is invalid: {}", e);
                (
                    ModelStatus::Unavailable {
                        reason: e.to_string(),
                    },
                    None,
                )
            }
        };

        Self::new(config, model, loader, metrics_handle)
    }
}

/// Build a loader for the configured strategy and sources
pub fn build_loader(config: &ServerConfig) -> textserve_core::Result<ModelLoader> {
    let sources = config.artifacts.sources()?;
    let fetcher = ArtifactFetcher::new(config.artifacts.timeout())?;
    Ok(ModelLoader::new(fetcher, sources))
}
