//! Atlas Export Library
//!
//! This library provides the paginated search export pipeline used by the
//! `atlas-export` command-line tool. It can be used on its own to fetch every
//! page of an Atlas unified search and write the results to files.
//!
//! # Modules
//!
//! - `cli`: Command-line interface and argument parsing
//! - `client`: Search endpoint trait and HTTP client
//! - `config`: Configuration management
//! - `debounce`: Delay-coalescing of rapid input
//! - `error`: Error types and handling
//! - `events`: Authorization event channel
//! - `export`: Fetch-all pipeline, limits, progress and format writers
//! - `model`: Filters, search params and result records
//! - `presenter`: Item presentation for listings
//! - `utils`: Utility functions and helpers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use atlas_export::{Config, ExportPipeline, FilterCriteria, HttpSearchClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let client = HttpSearchClient::new(&config.api.base_url, config.request_timeout())?;
//!     let pipeline = ExportPipeline::new(Arc::new(client), config.export.limits());
//!
//!     let estimate = pipeline.estimate(&FilterCriteria::search("joao")).await?;
//!     println!("{} titulares in {} pages", estimate.titular_count, estimate.total_pages);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod debounce;
pub mod error;
pub mod events;
pub mod export;
pub mod model;
pub mod presenter;
pub mod utils;

// Re-export commonly used types
pub use client::{HttpSearchClient, SearchEndpoint};
pub use config::Config;
pub use error::{AtlasError, Result};
pub use events::{AppEvent, EventBus};
pub use export::{ExportFormat, ExportPipeline, FetchOutcome};
pub use model::{FilterCriteria, Record};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
///
/// # Returns
/// * `&str` - Version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
