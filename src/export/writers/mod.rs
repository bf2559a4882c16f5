//! Format writers for export operations
//!
//! Each writer turns the full record list into the bytes of one file format.
//! Writers are independent: a failure in one never affects another, and
//! [`save`] only leaves a file behind when the whole write succeeded.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::{AtlasError, Result};
use crate::model::Record;

pub mod csv;
pub mod pdf;
pub mod xlsx;

pub use csv::CsvWriter;
pub use pdf::PdfWriter;
pub use xlsx::XlsxWriter;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Xlsx,
    Pdf,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Csv, ExportFormat::Xlsx, ExportFormat::Pdf];

    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Pdf => "pdf",
        }
    }

    /// Default writer for this format
    pub fn writer(&self) -> Box<dyn FormatWriter> {
        match self {
            ExportFormat::Csv => Box::new(CsvWriter::new()),
            ExportFormat::Xlsx => Box::new(XlsxWriter::new()),
            ExportFormat::Pdf => Box::new(PdfWriter::new()),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(format!(
                "unknown format '{}', expected csv, xlsx or pdf",
                other
            )),
        }
    }
}

/// Trait for rendering records into one file format
pub trait FormatWriter: Send + Sync {
    /// Format produced by this writer
    fn format(&self) -> ExportFormat;

    /// Render every record into the file contents
    ///
    /// # Arguments
    /// * `records` - Records to write, in output order
    ///
    /// # Returns
    /// * `Result<Vec<u8>>` - Complete file bytes or a serialization error
    fn render(&self, records: &[Record]) -> Result<Vec<u8>>;
}

/// A file produced by [`save`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub format: ExportFormat,
    pub path: PathBuf,
    pub records: usize,
    pub size_bytes: u64,
}

/// `{stem}_{YYYY-MM-DD}.{ext}` for the given date
pub fn file_name(stem: &str, format: ExportFormat, date: NaiveDate) -> String {
    format!("{}_{}.{}", stem, date.format("%Y-%m-%d"), format.extension())
}

/// `{stem}_{YYYY-MM-DD}.{ext}` using today's local date
pub fn default_file_name(stem: &str, format: ExportFormat) -> String {
    file_name(stem, format, Local::now().date_naive())
}

/// Render `records` with `writer` and store the file in `dir`
///
/// The file is written under a temporary name and renamed into place, so a
/// failed export never leaves a partial file at the final path.
pub async fn save(
    writer: &dyn FormatWriter,
    records: &[Record],
    dir: &Path,
    stem: &str,
) -> Result<ExportedFile> {
    let format = writer.format();
    let fail = |e: &dyn fmt::Display| AtlasError::serialization(format.extension(), e);

    if !dir.is_dir() {
        return Err(fail(&format!("Directory does not exist: {}", dir.display())));
    }

    debug!("Rendering {} records as {}", records.len(), format);
    let bytes = writer.render(records)?;

    let path = dir.join(default_file_name(stem, format));
    let part = path.with_extension(format!("{}.part", format.extension()));

    if let Err(e) = fs::write(&part, &bytes).await {
        let _ = fs::remove_file(&part).await;
        return Err(fail(&e));
    }
    if let Err(e) = fs::rename(&part, &path).await {
        warn!("Failed to move {} into place: {}", part.display(), e);
        let _ = fs::remove_file(&part).await;
        return Err(fail(&e));
    }

    info!("Exported {} records to {}", records.len(), path.display());

    Ok(ExportedFile {
        format,
        path,
        records: records.len(),
        size_bytes: bytes.len() as u64,
    })
}
