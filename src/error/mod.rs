//! Error handling module for export operations.
//!
//! This module provides the crate error taxonomy:
//! - `ExportError` for limit violations, page failures and serializer failures
//! - `ApiError` for the search endpoint
//! - `ConfigError` for configuration loading
//!
//! # Example
//!
//! ```rust,no_run
//! use atlas_export::error::{AtlasError, ExportError, Result};
//!
//! fn check(count: u64, max: u64) -> Result<()> {
//!     if count > max {
//!         return Err(ExportError::LimitExceeded { count, max }.into());
//!     }
//!     Ok(())
//! }
//! ```

pub mod kinds;

// Re-export commonly used types
pub use kinds::{ApiError, AtlasError, ConfigError, ExportError, Result};
