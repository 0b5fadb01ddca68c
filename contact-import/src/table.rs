use crate::cell::RawCell;
use crate::error::ImportError;
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use std::path::Path;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Upload formats, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Spreadsheet,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Result<Self, ImportError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "csv" | "txt" => Ok(TableFormat::Csv),
            "xlsx" | "xlsm" | "xls" | "ods" => Ok(TableFormat::Spreadsheet),
            _ => Err(ImportError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Reads CSV content or the first sheet of a workbook into rows of raw cells.
///
/// No header handling is done here: a header line becomes an ordinary row
/// and is rejected by the normalizer like any other non-number.
pub struct TableReader {
    delimiter: Option<u8>,
}

impl Default for TableReader {
    fn default() -> Self {
        Self::new()
    }
}

impl TableReader {
    /// Reader that picks `,`, `;` or tab from the first line.
    pub fn new() -> Self {
        Self { delimiter: None }
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        Self {
            delimiter: Some(delimiter),
        }
    }

    /// Reads a `.csv`/`.txt` file, or the first sheet of an `.xlsx`, `.xlsm`,
    /// `.xls` or `.ods` workbook. The delimiter only applies to CSV.
    pub fn read_path(&self, path: &Path) -> Result<Vec<Vec<RawCell>>, ImportError> {
        match TableFormat::from_path(path)? {
            TableFormat::Csv => {
                let content = std::fs::read(path)?;
                self.read(&content)
            }
            TableFormat::Spreadsheet => read_first_sheet(path),
        }
    }

    pub fn read(&self, content: &[u8]) -> Result<Vec<Vec<RawCell>>, ImportError> {
        let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);
        let delimiter = self.delimiter.unwrap_or_else(|| sniff_delimiter(content));

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(content);

        let mut rows = Vec::new();

        for (index, result) in reader.records().enumerate() {
            match result {
                Ok(record) => {
                    rows.push(record.iter().map(RawCell::from).collect());
                }
                Err(e) if e.is_io_error() => {
                    return Err(ImportError::Table(e.to_string()));
                }
                Err(e) => {
                    tracing::warn!(row = index + 1, "Failed to parse CSV row: {}", e);
                }
            }
        }

        Ok(rows)
    }
}

fn read_first_sheet(path: &Path) -> Result<Vec<Vec<RawCell>>, ImportError> {
    let mut workbook = open_workbook_auto(path)?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range?,
        None => return Ok(Vec::new()),
    };

    // Ranges start at the first used cell; pad so column indexes stay absolute
    let leading = range.start().map(|(_, col)| col as usize).unwrap_or(0);

    Ok(range
        .rows()
        .map(|row| {
            std::iter::repeat(RawCell::Empty)
                .take(leading)
                .chain(row.iter().map(cell_from_data))
                .collect()
        })
        .collect())
}

fn cell_from_data(data: &Data) -> RawCell {
    match data {
        Data::Empty => RawCell::Empty,
        Data::Int(i) => RawCell::Number(*i as f64),
        Data::Float(f) => RawCell::Number(*f),
        Data::String(s) if s.trim().is_empty() => RawCell::Empty,
        Data::String(s) => RawCell::Text(s.clone()),
        Data::Bool(b) => RawCell::Text(b.to_string()),
        Data::DateTime(dt) => RawCell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::Text(s.clone()),
        Data::Error(e) => RawCell::Text(e.to_string()),
    }
}

fn sniff_delimiter(content: &[u8]) -> u8 {
    let first_line = content
        .split(|b| *b == b'\n')
        .next()
        .unwrap_or_default();

    [b',', b';', b'\t']
        .into_iter()
        .map(|d| (d, first_line.iter().filter(|b| **b == d).count()))
        .filter(|(_, count)| *count > 0)
        .max_by_key(|(_, count)| *count)
        .map(|(d, _)| d)
        .unwrap_or(b',')
}
