//! Artifact acquisition from local files, cached downloads, or direct downloads

use bytes::Bytes;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use textserve_core::{Error, Result};
use tracing::{debug, info, warn};

/// Default timeout for artifact downloads
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Where an artifact's bytes come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactSource {
    /// Read from the local file system
    Local { path: PathBuf },

    /// Download once and keep a copy at `cache_path`; later loads read the copy
    Cached { url: String, cache_path: PathBuf },

    /// Download into memory on every load
    Remote { url: String },
}

impl ArtifactSource {
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self::Local { path: path.into() }
    }

    pub fn cached(url: impl Into<String>, cache_path: impl Into<PathBuf>) -> Self {
        Self::Cached {
            url: url.into(),
            cache_path: cache_path.into(),
        }
    }

    pub fn remote(url: impl Into<String>) -> Self {
        Self::Remote { url: url.into() }
    }

    /// Local file backing this source, if any
    pub fn local_path(&self) -> Option<&Path> {
        match self {
            Self::Local { path } => Some(path),
            Self::Cached { cache_path, .. } => Some(cache_path),
            Self::Remote { .. } => None,
        }
    }

    /// Human-readable description with access tokens stripped
    pub fn describe(&self) -> String {
        match self {
            Self::Local { path } => format!("local file {}", path.display()),
            Self::Cached { url, cache_path } => format!(
                "{} (cached at {})",
                redact_url(url),
                cache_path.display()
            ),
            Self::Remote { url } => redact_url(url).to_string(),
        }
    }
}

/// Drop the query string, which carries the signed-access token
pub fn redact_url(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

/// Build a remote artifact URL from an opaque base URL and access token
pub fn artifact_url(base_url: &str, file_name: &str, token: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let token = token.trim_start_matches('?');
    if token.is_empty() {
        format!("{base}/{file_name}")
    } else {
        format!("{base}/{file_name}?{token}")
    }
}

/// Fetches artifact bytes for any [`ArtifactSource`]
#[derive(Debug, Clone)]
pub struct ArtifactFetcher {
    client: reqwest::Client,
}

impl ArtifactFetcher {
    /// Create a fetcher whose downloads give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Create a fetcher around an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Fetch the raw artifact bytes
    pub async fn fetch(&self, source: &ArtifactSource) -> Result<Bytes> {
        match source {
            ArtifactSource::Local { path } => read_local(path).await,
            ArtifactSource::Cached { url, cache_path } => self.fetch_cached(url, cache_path).await,
            ArtifactSource::Remote { url } => self.download(url).await,
        }
    }

    async fn fetch_cached(&self, url: &str, cache_path: &Path) -> Result<Bytes> {
        if tokio::fs::try_exists(cache_path).await.unwrap_or(false) {
            debug!("Using cached artifact at {}", cache_path.display());
            return read_local(cache_path).await;
        }

        info!(
            "Cache miss for {}, downloading {}",
            cache_path.display(),
            redact_url(url)
        );
        let body = self.download(url).await?;

        // Cache write failures are non-fatal
        if let Err(e) = write_cache(cache_path, &body).await {
            warn!(
                "Failed to write artifact cache {}: {}",
                cache_path.display(),
                e
            );
        }
        Ok(body)
    }

    async fn download(&self, url: &str) -> Result<Bytes> {
        let shown = redact_url(url);
        debug!("GET {}", shown);

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                metrics::counter!("textserve_artifact_fetches_total", "outcome" => "error")
                    .increment(1);
                warn!("Artifact request to {} failed: {}", shown, transport_error(e));
                return Err(Error::download_failed(None, shown));
            }
        };

        let status = response.status();
        if !status.is_success() {
            metrics::counter!("textserve_artifact_fetches_total", "outcome" => "status")
                .increment(1);
            warn!("Artifact download from {} returned {}", shown, status);
            return Err(Error::download_failed(Some(status.as_u16()), shown));
        }

        let body = response.bytes().await.map_err(|e| {
            metrics::counter!("textserve_artifact_fetches_total", "outcome" => "error")
                .increment(1);
            warn!(
                "Failed to read artifact body from {}: {}",
                shown,
                transport_error(e)
            );
            Error::download_failed(Some(status.as_u16()), shown)
        })?;

        metrics::counter!("textserve_artifact_fetches_total", "outcome" => "success").increment(1);
        info!("Downloaded {} bytes from {}", body.len(), shown);
        Ok(body)
    }
}

/// Render a client error without its request URL, which carries the token
fn transport_error(e: reqwest::Error) -> String {
    e.without_url().to_string()
}

async fn read_local(path: &Path) -> Result<Bytes> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Bytes::from(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::not_found(path)),
        Err(e) => Err(Error::Io(e)),
    }
}

/// Write through a sibling temp file so readers never see a partial cache
async fn write_cache(cache_path: &Path, body: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = cache_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut tmp = OsString::from(cache_path.as_os_str());
    tmp.push(".part");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, body).await?;
    tokio::fs::rename(&tmp, cache_path).await?;
    debug!("Cached {} bytes at {}", body.len(), cache_path.display());
    Ok(())
}
