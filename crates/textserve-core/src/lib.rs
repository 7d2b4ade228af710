//! TextServe Core
//!
//! Core types shared across TextServe components.
//!
//! This crate provides:
//! - The error taxonomy for artifact loading and prediction
//! - The `Label` type produced by classifiers and returned over HTTP

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::Label;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::Label;
}
