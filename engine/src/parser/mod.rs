//! Quote-aware CSV codec.
//!
//! Reads an invoice export into a [`Table`] and writes it back out.
//!
//! # Format
//!
//! - First line is the heading line, every following line a record.
//! - Fields are comma separated. A `"` toggles the quoted state; while
//!   quoted, a comma is field data rather than a separator.
//! - Quote characters are kept in the stored field text, so a quoted field is
//!   written back exactly as it was read. [`unquoted`] gives the data content.
//! - A record whose quote count is odd continues on the next physical line;
//!   the lines are joined with `\n` until the count is even.
//! - `""` is not treated as an escaped quote, it simply toggles twice.
//!
//! The writer emits every field as stored, without re-quoting. A comma that
//! the pipeline introduces into an unquoted field therefore becomes a
//! separator on the next read.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::error::{CsvError, CsvResult, Issue};
use crate::logs::RunLog;
use crate::models::Table;

const QUOTE: char = '"';
const SEPARATOR: char = ',';
const UTF8_BOM: &str = "\u{feff}";

/// Result of reading a table, with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Parsed table
    pub table: Table,
    /// Detected or used encoding
    pub encoding: String,
}

// =============================================================================
// Tokenizer
// =============================================================================

/// Split one logical record into raw fields.
///
/// The final field is always flushed, so an empty line yields one empty
/// field and a trailing comma yields a trailing empty field.
///
/// # Example
/// ```
/// use invoice_fixer::tokenize;
///
/// let fields = tokenize(r#"a,"b,c",d"#);
/// assert_eq!(fields, vec!["a", r#""b,c""#, "d"]);
/// ```
pub fn tokenize(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;

    for c in line.chars() {
        match c {
            QUOTE => {
                quoted = !quoted;
                field.push(c);
            }
            SEPARATOR if !quoted => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }

    fields.push(field);
    fields
}

/// Data content of a field: one surrounding pair of quotes removed.
pub fn unquoted(field: &str) -> &str {
    field
        .strip_prefix(QUOTE)
        .and_then(|inner| inner.strip_suffix(QUOTE))
        .unwrap_or(field)
}

fn quote_count(text: &str) -> usize {
    text.matches(QUOTE).count()
}

// =============================================================================
// Logical records
// =============================================================================

/// Iterator over logical records, joining physical lines while a quoted
/// field is still open.
///
/// Empty physical lines between records are skipped; empty lines inside an
/// open quoted field are kept.
pub struct LogicalRecords<'a> {
    lines: std::str::Lines<'a>,
}

impl<'a> LogicalRecords<'a> {
    pub fn new(content: &'a str) -> Self {
        Self::from_lines(content.lines())
    }

    /// Continue from an already partially consumed line iterator.
    pub fn from_lines(lines: std::str::Lines<'a>) -> Self {
        Self { lines }
    }
}

impl Iterator for LogicalRecords<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let first = self.lines.by_ref().find(|line| !line.is_empty())?;
        let mut record = first.to_string();
        let mut quotes = quote_count(first);

        while quotes % 2 != 0 {
            let Some(next) = self.lines.next() else {
                break;
            };
            record.push('\n');
            record.push_str(next);
            quotes += quote_count(next);
        }

        Some(record)
    }
}

// =============================================================================
// Reading
// =============================================================================

/// Parse decoded CSV text into a table.
///
/// # Example
/// ```
/// use invoice_fixer::parse_table;
///
/// let table = parse_table("id,note\n1,\"multi\nline\"\n").unwrap();
/// assert_eq!(table.len(), 1);
/// assert_eq!(table.value(0, "note"), Some("\"multi\nline\""));
/// ```
pub fn parse_table(content: &str) -> CsvResult<Table> {
    let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);
    let mut lines = content.lines();
    let header_line = lines.next().ok_or(CsvError::EmptyFile)?;
    let mut table = Table::new(tokenize(header_line));

    for record in LogicalRecords::from_lines(lines) {
        table.push_fields(tokenize(&record));
    }

    Ok(table)
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8(bytes.to_vec())
            .map_err(|e| CsvError::Encoding(e.to_string())),
        // windows-1252 agrees with Latin-1 on every printable byte
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            Ok(encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned())
        }
        other => match encoding_rs::Encoding::for_label(other.as_bytes()) {
            Some(enc) => Ok(enc.decode(bytes).0.into_owned()),
            None => Ok(String::from_utf8_lossy(bytes).into_owned()),
        },
    }
}

/// Parse CSV bytes, decoding as UTF-8 when valid and detecting otherwise.
pub fn parse_bytes_auto(bytes: &[u8]) -> CsvResult<ParseResult> {
    let (content, encoding) = match std::str::from_utf8(bytes) {
        Ok(text) => (text.to_string(), "utf-8".to_string()),
        Err(_) => {
            let detected = detect_encoding(bytes);
            match decode_content(bytes, &detected) {
                Ok(text) if detected != "utf-8" => (text, detected),
                // chardet guessed UTF-8 for bytes that are not UTF-8
                _ => (
                    encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
                    "windows-1252".to_string(),
                ),
            }
        }
    };

    let table = parse_table(&content)?;
    Ok(ParseResult { table, encoding })
}

/// Read a CSV file into a table.
pub fn read_table<P: AsRef<Path>>(path: P) -> CsvResult<ParseResult> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| CsvError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_bytes_auto(&bytes)
}

/// Read a CSV file, degrading to an empty table on failure.
///
/// The failure is reported as [`Issue::MissingResource`].
pub fn read_table_or_empty<P: AsRef<Path>>(path: P, log: &mut RunLog) -> Table {
    let path = path.as_ref();
    match read_table(path) {
        Ok(result) => {
            log.success(format!(
                "Read {} rows, {} columns ({})",
                result.table.len(),
                result.table.headings().len(),
                result.encoding
            ));
            result.table
        }
        Err(e) => {
            log.report(Issue::MissingResource {
                resource: path.display().to_string(),
                reason: e.to_string(),
            });
            Table::default()
        }
    }
}

// =============================================================================
// Writing
// =============================================================================

/// Write a table as CSV, one `\n`-terminated line per row.
pub fn write_table_to<W: Write>(table: &Table, mut writer: W) -> io::Result<()> {
    writeln!(writer, "{}", table.headings().join(","))?;

    for row in table.rows() {
        let fields: Vec<&str> = table
            .headings()
            .iter()
            .map(|h| row.get(h).map(String::as_str).unwrap_or(""))
            .collect();
        writeln!(writer, "{}", fields.join(","))?;
    }

    writer.flush()
}

/// Render a table to a CSV string.
pub fn render_table(table: &Table) -> String {
    let mut out = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_table_to(table, &mut out);
    String::from_utf8_lossy(&out).into_owned()
}

/// Write a table to a file, replacing any existing content.
pub fn write_table<P: AsRef<Path>>(table: &Table, path: P) -> CsvResult<()> {
    let path = path.as_ref();
    let io_err = |source| CsvError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = fs::File::create(path).map_err(io_err)?;
    write_table_to(table, BufWriter::new(file)).map_err(io_err)
}
