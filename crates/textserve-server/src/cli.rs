use crate::config::Strategy;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use textserve_classifiers::ArtifactKind;

#[derive(Parser, Debug)]
#[command(name = "textserve")]
#[command(author, version, about = "Serve a fitted text classifier over HTTP")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load the model artifacts and start the HTTP server
    Serve(ServeArgs),

    /// Convert JSON-exported fitted parameters into a binary artifact
    ///
    /// Classifier classes may be integers, strings, or integral floats such
    /// as `1.0`, which are stored as integers.
    Pack {
        /// Artifact kind: vectorizer or classifier
        #[arg(short, long)]
        kind: ArtifactKind,

        /// JSON parameters file
        #[arg(short, long)]
        input: PathBuf,

        /// Artifact file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Configuration file path
    #[arg(short, long, env = "TEXTSERVE_CONFIG", default_value = "textserve.yaml")]
    pub config: String,

    /// Listen address
    #[arg(short = 'l', long, env = "TEXTSERVE_LISTEN", default_value = "0.0.0.0")]
    pub listen: String,

    /// Listen port
    #[arg(short = 'P', long, env = "TEXTSERVE_PORT", default_value = "8000")]
    pub port: u16,

    /// Artifact acquisition strategy: local, cached, or remote
    #[arg(long, env = "TEXTSERVE_STRATEGY")]
    pub strategy: Option<Strategy>,

    /// Classifier artifact path (local file or cache file)
    #[arg(long, env = "TEXTSERVE_MODEL_PATH")]
    pub model_path: Option<PathBuf>,

    /// Vectorizer artifact path (local file or cache file)
    #[arg(long, env = "TEXTSERVE_VECTORIZER_PATH")]
    pub vectorizer_path: Option<PathBuf>,

    /// Base URL of the remote artifact store
    #[arg(long, env = "TEXTSERVE_BASE_URL")]
    pub base_url: Option<String>,

    /// Signed-access token appended to remote artifact URLs
    #[arg(long, env = "TEXTSERVE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Download timeout in seconds
    #[arg(long, env = "TEXTSERVE_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}
