//! TextServe Server
//!
//! HTTP front end for a fitted text classifier. The model pair is loaded once
//! at startup from the configured [`config::Strategy`]; a failed load leaves
//! the server up with predictions refused and the diagnostic routes available.

pub mod app;
pub mod cli;
pub mod config;
pub mod routes;
pub mod state;

pub use app::{build_app, run_server};
pub use config::{ServerConfig, Strategy};
pub use state::AppState;
