//! Excel writer for export operations

use rust_xlsxwriter::{Format, Workbook};
use tracing::debug;

use crate::error::{AtlasError, Result};
use crate::export::row::{ExportRow, HEADERS, prepare_rows};
use crate::model::Record;

use super::{ExportFormat, FormatWriter};

/// Rows sampled when sizing columns
const WIDTH_SAMPLE_ROWS: usize = 50;

/// Extra characters added to every column width
const WIDTH_PADDING: usize = 2;

/// Writer for single-sheet XLSX workbooks
#[derive(Debug, Clone)]
pub struct XlsxWriter {
    sheet_name: String,
}

impl Default for XlsxWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl XlsxWriter {
    pub fn new() -> Self {
        Self {
            sheet_name: "Pesquisa".to_string(),
        }
    }

    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = name.into();
        self
    }

    fn build(
        &self,
        rows: &[ExportRow],
    ) -> std::result::Result<Vec<u8>, rust_xlsxwriter::XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&self.sheet_name)?;

        let header_format = Format::new().set_bold();

        for (col, header) in HEADERS.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
        }

        // Document numbers stay text so leading zeros survive
        for (row_idx, row) in rows.iter().enumerate() {
            let excel_row = (row_idx + 1) as u32;
            for (col_idx, value) in row.values().iter().enumerate() {
                worksheet.write_string(excel_row, col_idx as u16, *value)?;
            }
        }

        for (col, width) in column_widths(rows).into_iter().enumerate() {
            worksheet.set_column_width(col as u16, width as f64)?;
        }

        workbook.save_to_buffer()
    }
}

/// Width of each column in characters
///
/// The larger of the header length and the longest value among the first
/// rows, plus padding.
pub fn column_widths(rows: &[ExportRow]) -> Vec<usize> {
    HEADERS
        .iter()
        .enumerate()
        .map(|(col, header)| {
            let longest = rows
                .iter()
                .take(WIDTH_SAMPLE_ROWS)
                .map(|row| row.values()[col].chars().count())
                .max()
                .unwrap_or(0);
            header.chars().count().max(longest) + WIDTH_PADDING
        })
        .collect()
}

impl FormatWriter for XlsxWriter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Xlsx
    }

    fn render(&self, records: &[Record]) -> Result<Vec<u8>> {
        let rows = prepare_rows(records);
        let bytes = self
            .build(&rows)
            .map_err(|e| AtlasError::serialization("xlsx", e))?;
        debug!("Rendered XLSX: {} rows, {} bytes", rows.len(), bytes.len());
        Ok(bytes)
    }
}
