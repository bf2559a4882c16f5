//! CSV writer for export operations
//!
//! Produces semicolon-separated UTF-8 text with a byte-order mark so that
//! spreadsheet applications detect the encoding and the delimiter.

use tracing::debug;

use crate::error::{AtlasError, Result};
use crate::export::row::{HEADERS, prepare_rows};
use crate::model::Record;

use super::{ExportFormat, FormatWriter};

/// UTF-8 byte-order mark
const BOM: &[u8] = "\u{FEFF}".as_bytes();

/// Writer for CSV format
#[derive(Debug, Clone)]
pub struct CsvWriter {
    /// Field delimiter
    delimiter: u8,
}

impl Default for CsvWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvWriter {
    /// Create a semicolon-delimited CSV writer
    pub fn new() -> Self {
        Self { delimiter: b';' }
    }
}

impl FormatWriter for CsvWriter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Csv
    }

    fn render(&self, records: &[Record]) -> Result<Vec<u8>> {
        let rows = prepare_rows(records);

        let mut buffer = Vec::with_capacity(64 * (rows.len() + 1));
        buffer.extend_from_slice(BOM);

        // Fields holding the delimiter, a quote or a line break get quoted
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(buffer);

        let to_error = |e: csv::Error| AtlasError::serialization("csv", e);
        writer.write_record(HEADERS).map_err(to_error)?;
        for row in &rows {
            writer.write_record(row.values()).map_err(to_error)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| AtlasError::serialization("csv", e.error()))?;

        debug!("Rendered CSV: {} rows, {} bytes", rows.len(), bytes.len());
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(records: &[Record]) -> String {
        let bytes = CsvWriter::new().render(records).unwrap();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_bom_and_header() {
        let content = render(&[]);
        assert!(content.starts_with('\u{FEFF}'));

        let lines: Vec<&str> = content.trim_start_matches('\u{FEFF}').lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("Nome;Tipo;Vínculo/Relação;Amparo;RNM"));
        assert!(lines[0].ends_with("Email;Telefone"));
    }

    #[test]
    fn test_one_line_per_record() {
        let records = vec![
            Record::titular("Maria"),
            Record::dependente("Ana", "Maria"),
        ];
        let content = render(&records);
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("Maria;Titular;-;"));
        assert!(lines[2].starts_with("Ana;Dependente;Dependente de Maria;"));
    }

    #[test]
    fn test_quote_and_delimiter_escaping() {
        let record = Record::titular(r#"He said "hi"; bye"#);
        let content = render(&[record]);
        assert!(content.contains(r#""He said ""hi""; bye";Titular"#));
    }

    #[test]
    fn test_line_breaks_stay_inside_quotes() {
        let record = Record::titular("Linha 1\nLinha 2");
        let content = render(&[record]);
        assert!(content.contains("\"Linha 1\nLinha 2\";Titular"));
    }

    #[test]
    fn test_comma_is_not_quoted() {
        let record = Record::titular("Silva, Maria");
        let content = render(&[record]);
        assert!(content.contains("\nSilva, Maria;Titular;"));
    }
}
