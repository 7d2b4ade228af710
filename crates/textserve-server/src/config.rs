//! Server configuration

use crate::cli::ServeArgs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use textserve_classifiers::{artifact_url, ArtifactSource, ArtifactSources};

/// Server configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Where the model artifacts come from
    #[serde(default)]
    pub artifacts: ArtifactsConfig,

    /// Cross-origin policy
    #[serde(default)]
    pub cors: CorsConfig,
}

impl ServerConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(config_path: &str, args: &ServeArgs) -> anyhow::Result<Self> {
        // Try to load from file, or use defaults
        let mut config = if Path::new(config_path).exists() {
            let content = std::fs::read_to_string(config_path)?;
            Self::from_yaml(&content)?
        } else {
            Self::default()
        };

        config.apply_overrides(args);
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply CLI/env overrides on top of file values
    pub fn apply_overrides(&mut self, args: &ServeArgs) {
        let artifacts = &mut self.artifacts;

        if let Some(strategy) = args.strategy {
            artifacts.strategy = strategy;
        }
        if let Some(path) = &args.model_path {
            artifacts.model_path = path.clone();
        }
        if let Some(path) = &args.vectorizer_path {
            artifacts.vectorizer_path = path.clone();
        }
        if let Some(timeout) = args.timeout_secs {
            artifacts.timeout_secs = timeout;
        }

        if args.base_url.is_some() || args.token.is_some() {
            let remote = artifacts.remote.get_or_insert_with(RemoteConfig::default);
            if let Some(base_url) = &args.base_url {
                remote.base_url = base_url.clone();
            }
            if let Some(token) = &args.token {
                remote.token = token.clone();
            }
        }
    }
}

/// Artifact acquisition strategy, fixed for the life of the process
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Read both artifacts from local files
    #[default]
    Local,
    /// Download once into the local paths, then reuse them
    Cached,
    /// Download into memory on every start
    Remote,
}

impl std::str::FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "cached" | "cache" => Ok(Self::Cached),
            "remote" | "memory" => Ok(Self::Remote),
            other => Err(format!(
                "unknown strategy '{other}', expected local, cached, or remote"
            )),
        }
    }
}

/// Artifact locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactsConfig {
    #[serde(default)]
    pub strategy: Strategy,

    /// Classifier file (local path or cache path); its file name is also the remote name
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// Vectorizer file (local path or cache path); its file name is also the remote name
    #[serde(default = "default_vectorizer_path")]
    pub vectorizer_path: PathBuf,

    /// Remote store, required by the cached and remote strategies
    #[serde(default)]
    pub remote: Option<RemoteConfig>,

    /// Download timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            model_path: default_model_path(),
            vectorizer_path: default_vectorizer_path(),
            remote: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ArtifactsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Resolve acquisition descriptors for both artifacts
    pub fn sources(&self) -> textserve_core::Result<ArtifactSources> {
        Ok(ArtifactSources {
            vectorizer: self.source_for(&self.vectorizer_path)?,
            classifier: self.source_for(&self.model_path)?,
        })
    }

    fn source_for(&self, path: &Path) -> textserve_core::Result<ArtifactSource> {
        if self.strategy == Strategy::Local {
            return Ok(ArtifactSource::local(path));
        }

        let remote = self
            .remote
            .as_ref()
            .filter(|r| !r.base_url.trim().is_empty())
            .ok_or_else(|| {
                textserve_core::Error::config(format!(
                    "artifacts.remote.base_url is required for the {:?} strategy",
                    self.strategy
                ))
            })?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                textserve_core::Error::config(format!(
                    "artifact path {} has no file name",
                    path.display()
                ))
            })?;

        let url = artifact_url(&remote.base_url, file_name, &remote.token);
        Ok(match self.strategy {
            Strategy::Cached => ArtifactSource::cached(url, path),
            _ => ArtifactSource::remote(url),
        })
    }
}

/// Remote artifact store. Both values are opaque and passed through as-is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub base_url: String,

    /// Signed-access token, appended as the URL query string
    #[serde(default)]
    pub token: String,
}

/// CORS configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins; empty allows any origin
    #[serde(default)]
    pub allow_origins: Vec<String>,
}

fn default_model_path() -> PathBuf {
    PathBuf::from("api/finalized_model.sav")
}

fn default_vectorizer_path() -> PathBuf {
    PathBuf::from("api/count_vectorizer.sav")
}

fn default_timeout_secs() -> u64 {
    30
}
