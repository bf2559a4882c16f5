//! PDF writer for export operations
//!
//! Generates a landscape A4 document directly as PDF 1.4 objects using the
//! built-in Helvetica fonts, so no external font files are required. Text is
//! encoded as WinAnsi; characters outside Latin-1 are replaced by `?`.

use std::ops::Range;

use chrono::{DateTime, Local};
use tracing::debug;

use crate::error::Result;
use crate::export::row::{ExportRow, format_date, short_relation_text};
use crate::model::{Record, RecordType};
use crate::utils::string::truncate;

use super::{ExportFormat, FormatWriter};

const DEFAULT_TITLE: &str = "Pesquisa Avançada - Atlas";

const PAGE_WIDTH: f64 = 841.89;
const PAGE_HEIGHT: f64 = 595.28;
const PT_PER_MM: f64 = 72.0 / 25.4;

const MARGIN_MM: f64 = 14.0;
const TITLE_Y_MM: f64 = 15.0;
const GENERATED_Y_MM: f64 = 22.0;
const TOTAL_Y_MM: f64 = 27.0;
const TABLE_START_MM: f64 = 32.0;
const BOTTOM_MARGIN_MM: f64 = 15.0;
const FOOTER_Y_MM: f64 = 10.0;
const CELL_PADDING_MM: f64 = 2.0;

const TITLE_SIZE: f64 = 16.0;
const INFO_SIZE: f64 = 10.0;
const TABLE_SIZE: f64 = 8.0;
const FOOTER_SIZE: f64 = 8.0;

/// Column titles and widths in millimetres
const COLUMNS: [(&str, f64); 7] = [
    ("Nome", 50.0),
    ("Tipo", 20.0),
    ("Vínculo/Relação", 50.0),
    ("Amparo", 40.0),
    ("RNM", 30.0),
    ("Fim Vínculo", 25.0),
    ("Status", 25.0),
];

const NAME_MAX: usize = 40;
const RELATION_MAX: usize = 35;
const AMPARO_MAX: usize = 25;

type Rgb = (u8, u8, u8);

const BLACK: Rgb = (0, 0, 0);
const WHITE: Rgb = (255, 255, 255);
const HEADER_FILL: Rgb = (59, 130, 246);
const STRIPE_FILL: Rgb = (245, 247, 250);
const MUTED: Rgb = (100, 100, 100);

/// Object number of the first page; pages and content streams alternate after it
const FIRST_PAGE_OBJECT: usize = 6;

fn mm(value: f64) -> f64 {
    value * PT_PER_MM
}

fn row_height() -> f64 {
    TABLE_SIZE * 1.15 + 2.0 * mm(CELL_PADDING_MM)
}

/// Writer for the paginated PDF report
#[derive(Debug, Clone)]
pub struct PdfWriter {
    title: String,
    generated_at: DateTime<Local>,
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            generated_at: Local::now(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_generated_at(mut self, generated_at: DateTime<Local>) -> Self {
        self.generated_at = generated_at;
        self
    }

    fn draw_page(
        &self,
        rows: &[[String; 7]],
        range: Range<usize>,
        page_number: usize,
        page_count: usize,
        total_records: usize,
    ) -> Vec<u8> {
        let mut canvas = Canvas::default();

        let table_top = if page_number == 1 {
            canvas.text(
                Font::Bold,
                TITLE_SIZE,
                mm(MARGIN_MM),
                mm(TITLE_Y_MM),
                &self.title,
                BLACK,
            );
            canvas.text(
                Font::Regular,
                INFO_SIZE,
                mm(MARGIN_MM),
                mm(GENERATED_Y_MM),
                &format!(
                    "Gerado em: {}",
                    self.generated_at.format("%d/%m/%Y %H:%M:%S")
                ),
                MUTED,
            );
            canvas.text(
                Font::Regular,
                INFO_SIZE,
                mm(MARGIN_MM),
                mm(TOTAL_Y_MM),
                &format!("Total de registros: {}", total_records),
                MUTED,
            );
            mm(TABLE_START_MM)
        } else {
            mm(MARGIN_MM)
        };

        let height = row_height();
        let headers = COLUMNS.map(|(title, _)| title.to_string());
        canvas.table_row(&headers, table_top, Some(HEADER_FILL), Font::Bold, WHITE);

        let mut y = table_top + height;
        for index in range {
            let fill = (index % 2 == 1).then_some(STRIPE_FILL);
            canvas.table_row(&rows[index], y, fill, Font::Regular, BLACK);
            y += height;
        }

        let footer = format!("Página {} de {}", page_number, page_count);
        let x = (PAGE_WIDTH - approx_width(&footer, FOOTER_SIZE)) / 2.0;
        canvas.text(
            Font::Regular,
            FOOTER_SIZE,
            x,
            PAGE_HEIGHT - mm(FOOTER_Y_MM),
            &footer,
            MUTED,
        );

        canvas.into_bytes()
    }
}

impl FormatWriter for PdfWriter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Pdf
    }

    fn render(&self, records: &[Record]) -> Result<Vec<u8>> {
        let rows: Vec<[String; 7]> = records.iter().map(table_cells).collect();
        let ranges = page_ranges(rows.len());
        let page_count = ranges.len();

        let pages: Vec<Vec<u8>> = ranges
            .into_iter()
            .enumerate()
            .map(|(i, range)| self.draw_page(&rows, range, i + 1, page_count, records.len()))
            .collect();

        let bytes = assemble(&self.title, &self.generated_at, &pages);
        debug!(
            "Rendered PDF: {} rows on {} pages, {} bytes",
            rows.len(),
            page_count,
            bytes.len()
        );
        Ok(bytes)
    }
}

/// The seven table cells for one record
fn table_cells(record: &Record) -> [String; 7] {
    let row = ExportRow::from_record(record);
    let tipo = if record.record_type.is_primary() {
        "Tit."
    } else {
        "Dep."
    };
    [
        truncate(&row.nome, NAME_MAX),
        tipo.to_string(),
        truncate(&short_relation_text(record), RELATION_MAX),
        truncate(&row.amparo, AMPARO_MAX),
        row.rnm,
        format_date(record.data_fim_vinculo.as_deref()),
        short_status(record).to_string(),
    ]
}

fn short_status(record: &Record) -> &'static str {
    match (record.record_type, record.status) {
        (RecordType::Primary, Some(false)) => "Inat.",
        (RecordType::Primary, None) => "S/V",
        _ => "Ativo",
    }
}

fn rows_fitting(table_top_mm: f64) -> usize {
    let available = PAGE_HEIGHT - mm(BOTTOM_MARGIN_MM) - mm(table_top_mm) - row_height();
    ((available / row_height()).floor() as usize).max(1)
}

/// Split `rows` into per-page index ranges; there is always at least one page
fn page_ranges(rows: usize) -> Vec<Range<usize>> {
    let first = rows_fitting(TABLE_START_MM);
    let rest = rows_fitting(MARGIN_MM);

    let mut ranges = vec![0..rows.min(first)];
    let mut start = rows.min(first);
    while start < rows {
        let end = (start + rest).min(rows);
        ranges.push(start..end);
        start = end;
    }
    ranges
}

/// Rough Helvetica advance width, good enough for centering short labels
fn approx_width(text: &str, size: f64) -> f64 {
    text.chars().count() as f64 * size * 0.5
}

#[derive(Debug, Clone, Copy)]
enum Font {
    Bold,
    Regular,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Bold => "/F1",
            Font::Regular => "/F2",
        }
    }
}

/// Content stream for one page, addressed in points from the top-left corner
#[derive(Default)]
struct Canvas {
    buf: Vec<u8>,
}

impl Canvas {
    fn op(&mut self, s: &str) {
        self.buf.extend_from_slice(s.as_bytes());
        self.buf.push(b'\n');
    }

    fn fill_color(&mut self, (r, g, b): Rgb) {
        self.op(&format!(
            "{:.3} {:.3} {:.3} rg",
            r as f64 / 255.0,
            g as f64 / 255.0,
            b as f64 / 255.0
        ));
    }

    fn fill_rect(&mut self, x: f64, top: f64, width: f64, height: f64, color: Rgb) {
        self.fill_color(color);
        self.op(&format!(
            "{:.2} {:.2} {:.2} {:.2} re f",
            x,
            PAGE_HEIGHT - top - height,
            width,
            height
        ));
    }

    fn text(&mut self, font: Font, size: f64, x: f64, baseline: f64, text: &str, color: Rgb) {
        self.op("BT");
        self.fill_color(color);
        self.op(&format!("{} {} Tf", font.resource(), size));
        self.op(&format!("{:.2} {:.2} Td", x, PAGE_HEIGHT - baseline));
        self.buf.push(b'(');
        self.buf.extend(encode_text(text));
        self.op(") Tj");
        self.op("ET");
    }

    /// One table row; each cell is clipped to its column
    fn table_row(
        &mut self,
        cells: &[String; 7],
        top: f64,
        fill: Option<Rgb>,
        font: Font,
        color: Rgb,
    ) {
        let height = row_height();
        let table_width: f64 = COLUMNS.iter().map(|(_, w)| mm(*w)).sum();
        if let Some(fill) = fill {
            self.fill_rect(mm(MARGIN_MM), top, table_width, height, fill);
        }

        let padding = mm(CELL_PADDING_MM);
        let baseline = top + (height + TABLE_SIZE * 0.7) / 2.0;
        let mut x = mm(MARGIN_MM);
        for (cell, (_, width_mm)) in cells.iter().zip(COLUMNS) {
            let width = mm(width_mm);
            self.op("q");
            self.op(&format!(
                "{:.2} {:.2} {:.2} {:.2} re W n",
                x,
                PAGE_HEIGHT - top - height,
                width,
                height
            ));
            self.text(font, TABLE_SIZE, x + padding, baseline, cell, color);
            self.op("Q");
            x += width;
        }
    }

    fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Escape and encode text for a PDF string literal in WinAnsi
fn encode_text(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push(b'\\');
                out.push(c as u8);
            }
            '\n' | '\r' | '\t' => out.push(b' '),
            c if (c as u32) < 0x80 => out.push(c as u8),
            c if (0xA0..=0xFF).contains(&(c as u32)) => out.push(c as u32 as u8),
            c => out.push(winansi_extra(c).unwrap_or(b'?')),
        }
    }
    out
}

/// WinAnsi code for characters outside Latin-1 (the 0x80-0x9F block)
fn winansi_extra(c: char) -> Option<u8> {
    let code = match c {
        '\u{20AC}' => 0x80,
        '\u{201A}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02C6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8A,
        '\u{2039}' => 0x8B,
        '\u{0152}' => 0x8C,
        '\u{017D}' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02DC}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9A,
        '\u{203A}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{017E}' => 0x9E,
        '\u{0178}' => 0x9F,
        _ => return None,
    };
    Some(code)
}

/// Assemble catalog, fonts, info and page objects into a complete file
fn assemble(title: &str, created: &DateTime<Local>, pages: &[Vec<u8>]) -> Vec<u8> {
    let mut pdf: Vec<u8> = Vec::new();
    let mut offsets: Vec<usize> = Vec::new();

    pdf.extend_from_slice(b"%PDF-1.4\n");

    offsets.push(pdf.len());
    pdf.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");

    let kids = (0..pages.len())
        .map(|i| format!("{} 0 R", FIRST_PAGE_OBJECT + 2 * i))
        .collect::<Vec<_>>()
        .join(" ");
    offsets.push(pdf.len());
    pdf.extend_from_slice(
        format!(
            "2 0 obj\n<< /Type /Pages /Kids [{}] /Count {} >>\nendobj\n",
            kids,
            pages.len()
        )
        .as_bytes(),
    );

    offsets.push(pdf.len());
    pdf.extend_from_slice(
        b"3 0 obj\n<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>\nendobj\n",
    );

    offsets.push(pdf.len());
    pdf.extend_from_slice(
        b"4 0 obj\n<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>\nendobj\n",
    );

    offsets.push(pdf.len());
    pdf.extend_from_slice(b"5 0 obj\n<< /Title (");
    pdf.extend(encode_text(title));
    pdf.extend_from_slice(
        format!(
            ") /Producer (atlas-export) /CreationDate (D:{}) >>\nendobj\n",
            created.format("%Y%m%d%H%M%S")
        )
        .as_bytes(),
    );

    for (i, content) in pages.iter().enumerate() {
        let page_id = FIRST_PAGE_OBJECT + 2 * i;
        let content_id = page_id + 1;

        offsets.push(pdf.len());
        pdf.extend_from_slice(
            format!(
                "{page_id} 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
                 /Contents {content_id} 0 R /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> >>\nendobj\n"
            )
            .as_bytes(),
        );

        offsets.push(pdf.len());
        pdf.extend_from_slice(
            format!("{content_id} 0 obj\n<< /Length {} >>\nstream\n", content.len()).as_bytes(),
        );
        pdf.extend_from_slice(content);
        pdf.extend_from_slice(b"\nendstream\nendobj\n");
    }

    let xref_offset = pdf.len();
    let num_objects = offsets.len() + 1;
    pdf.extend_from_slice(format!("xref\n0 {num_objects}\n").as_bytes());
    pdf.extend_from_slice(b"0000000000 65535 f \n");
    for offset in &offsets {
        pdf.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }

    pdf.extend_from_slice(
        format!("trailer\n<< /Size {num_objects} /Root 1 0 R /Info 5 0 R >>\n").as_bytes(),
    );
    pdf.extend_from_slice(format!("startxref\n{xref_offset}\n%%EOF\n").as_bytes());

    pdf
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    fn writer() -> PdfWriter {
        let at = Local.with_ymd_and_hms(2025, 12, 22, 10, 30, 5).unwrap();
        PdfWriter::new().with_generated_at(at)
    }

    fn titulares(n: usize) -> Vec<Record> {
        (0..n).map(|i| Record::titular(format!("Pessoa {i}"))).collect()
    }

    #[test]
    fn test_pdf_structure() {
        let bytes = writer().render(&titulares(3)).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert!(bytes.ends_with(b"%%EOF\n"));
        assert!(contains(&bytes, b"/MediaBox [0 0 841.89 595.28]"));
        assert!(contains(&bytes, b"/Count 1"));
    }

    #[test]
    fn test_header_lines() {
        let bytes = writer().render(&titulares(3)).unwrap();
        // Latin-1 encoded title
        assert!(contains(&bytes, b"(Pesquisa Avan\xE7ada - Atlas)"));
        assert!(contains(&bytes, b"(Gerado em: 22/12/2025 10:30:05)"));
        assert!(contains(&bytes, b"(Total de registros: 3)"));
        assert!(contains(&bytes, b"(V\xEDnculo/Rela\xE7\xE3o)"));
    }

    #[test]
    fn test_zero_records() {
        let bytes = writer().render(&[]).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(contains(&bytes, b"(Total de registros: 0)"));
        assert!(contains(&bytes, b"(P\xE1gina 1 de 1)"));
    }

    #[test]
    fn test_many_rows_span_pages() {
        let records = titulares(100);
        let expected = page_ranges(100).len();
        assert!(expected > 1);

        let bytes = writer().render(&records).unwrap();
        assert!(contains(&bytes, format!("/Count {expected}").as_bytes()));
        let last = format!("Página {expected} de {expected}");
        assert!(contains(&bytes, &encode_text(&last)));
        assert!(contains(&bytes, b"(Pessoa 99)"));
    }

    #[test]
    fn test_page_ranges() {
        let first = rows_fitting(TABLE_START_MM);
        let rest = rows_fitting(MARGIN_MM);
        assert!(rest > first);

        assert_eq!(page_ranges(0), vec![0..0]);
        assert_eq!(page_ranges(first), vec![0..first]);
        assert_eq!(
            page_ranges(first + 1),
            vec![0..first, first..first + 1]
        );
        assert_eq!(page_ranges(first + rest + 1).len(), 3);
    }

    #[test]
    fn test_table_cells_abbreviate() {
        let mut titular =
            Record::titular("Nome Extremamente Comprido Que Passa Do Limite De Quarenta");
        titular.status = Some(false);
        let cells = table_cells(&titular);
        assert_eq!(cells[0].chars().count(), NAME_MAX);
        assert!(cells[0].ends_with("..."));
        assert_eq!(cells[1], "Tit.");
        assert_eq!(cells[6], "Inat.");

        let dependent = Record::dependente("Ana", "Carlos Souza");
        let cells = table_cells(&dependent);
        assert_eq!(cells[1], "Dep.");
        assert_eq!(cells[2], "Dep. de Carlos");
        assert_eq!(cells[6], "Ativo");

        assert_eq!(table_cells(&Record::titular("X"))[6], "S/V");
    }

    #[test]
    fn test_encode_text() {
        assert_eq!(encode_text("(sale)"), b"\\(sale\\)".to_vec());
        assert_eq!(encode_text("a\\b"), b"a\\\\b".to_vec());
        assert_eq!(encode_text("São"), b"S\xE3o".to_vec());
        assert_eq!(encode_text("日本"), b"??".to_vec());
        assert_eq!(encode_text("a\nb"), b"a b".to_vec());
    }

    #[test]
    fn test_encode_text_windows_punctuation() {
        assert_eq!(encode_text("D\u{2019}\u{C1}vila"), b"D\x92\xC1vila".to_vec());
        assert_eq!(encode_text("\u{201C}x\u{201D}"), b"\x93x\x94".to_vec());
        assert_eq!(encode_text("10\u{20AC} \u{2013} 5\u{2026}"), b"10\x80 \x96 5\x85".to_vec());
        assert_eq!(encode_text("\u{0160}\u{0178}"), b"\x8A\x9F".to_vec());
        // 0x81 is unassigned in WinAnsi
        assert_eq!(encode_text("\u{0081}"), b"?".to_vec());
    }

    #[test]
    fn test_custom_title_in_info() {
        let bytes = writer().with_title("Relatório (teste)").render(&[]).unwrap();
        assert!(contains(&bytes, b"/Title (Relat\xF3rio \\(teste\\))"));
    }

    #[test]
    fn test_cells_are_clipped() {
        let bytes = writer().render(&titulares(1)).unwrap();
        assert!(contains(&bytes, b"re W n"));
    }
}
