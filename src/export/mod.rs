//! Export module for paginated search exports
//!
//! This module turns a filtered search into downloadable files:
//! - Fetch-all over a paginated endpoint, one page at a time
//! - Record-limit enforcement and large-export warnings
//! - Progress reporting per page
//! - Multiple output formats (CSV, XLSX, PDF)
//!
//! # Architecture
//!
//! 1. **ExportPipeline**: Walks the pages of a [`SearchEndpoint`](crate::client::SearchEndpoint)
//!    and accumulates records
//! 2. **ProgressTracker**: Renders [`ExportProgress`] updates for users
//! 3. **FormatWriter**: Renders the accumulated records into one file format
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use atlas_export::client::HttpSearchClient;
//! use atlas_export::export::{ExportFormat, ExportLimits, ExportPipeline, writers};
//! use atlas_export::model::FilterCriteria;
//!
//! # async fn run() -> atlas_export::error::Result<()> {
//! let client = HttpSearchClient::new("https://atlas.example.com", Duration::from_secs(30))?;
//! let pipeline = ExportPipeline::new(Arc::new(client), ExportLimits::default());
//!
//! let outcome = pipeline.fetch_all(&FilterCriteria::search("joao")).await?;
//! for format in ExportFormat::ALL {
//!     let writer = format.writer();
//!     writers::save(writer.as_ref(), &outcome.records, Path::new("."), "pesquisa_atlas").await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod limits;
pub mod pipeline;
pub mod progress;
pub mod row;
pub mod writers;

pub use limits::ExportLimits;
pub use pipeline::{ExportEstimate, ExportPipeline, FetchOutcome};
pub use progress::{ExportProgress, ProgressTracker};
pub use row::{ExportRow, HEADERS, prepare_rows};
pub use writers::{ExportFormat, ExportedFile, FormatWriter};
