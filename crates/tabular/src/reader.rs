//! Spreadsheet readers: uploaded bytes → raw grid.
//!
//! Only the first worksheet is read. Any failure to parse the bytes is a
//! `MalformedFile` error scoped to that one upload.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use mailmerge_core::{MergeError, MergeResult};
use serde::{Deserialize, Serialize};

use crate::cell::{Cell, SheetInput};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetFormat {
    Csv,
    /// Any workbook calamine can open (xlsx, xlsm, xlsb, xls, ods).
    Xlsx,
}

impl SheetFormat {
    pub fn from_file_name(name: &str) -> Option<Self> {
        let ext = name.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "csv" | "txt" => Some(SheetFormat::Csv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(SheetFormat::Xlsx),
            _ => None,
        }
    }

    /// Guess from content: zip (xlsx/ods) and OLE (xls) signatures mean a
    /// workbook, anything else is treated as delimited text.
    pub fn sniff(bytes: &[u8]) -> Self {
        const ZIP: &[u8] = b"PK\x03\x04";
        const OLE: &[u8] = b"\xD0\xCF\x11\xE0";
        if bytes.starts_with(ZIP) || bytes.starts_with(OLE) {
            SheetFormat::Xlsx
        } else {
            SheetFormat::Csv
        }
    }

    /// Format from the file name when it has a known extension, else from content.
    pub fn detect(file_name: Option<&str>, bytes: &[u8]) -> Self {
        file_name
            .and_then(SheetFormat::from_file_name)
            .unwrap_or_else(|| SheetFormat::sniff(bytes))
    }
}

/// Read the first worksheet of `bytes` as a raw grid.
pub fn read_sheet(bytes: &[u8], format: SheetFormat) -> MergeResult<SheetInput> {
    let grid = match format {
        SheetFormat::Csv => read_csv(bytes)?,
        SheetFormat::Xlsx => read_workbook(bytes)?,
    };
    tracing::debug!(rows = grid.len(), ?format, "sheet read");
    Ok(SheetInput::Grid(grid))
}

fn read_csv(bytes: &[u8]) -> MergeResult<Vec<Vec<Cell>>> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let delimiter = sniff_delimiter(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(bytes);

    // The csv reader skips blank lines; they are put back as empty rows so
    // grid index `i` stays sheet row `i + 1`.
    let mut grid = Vec::new();
    let mut next_line = 1u64;
    let mut record = csv::StringRecord::new();
    loop {
        let more = reader
            .read_record(&mut record)
            .map_err(|e| MergeError::malformed_file(format!("csv row {}: {e}", grid.len() + 1)))?;
        if !more {
            break;
        }

        let position = reader.position();
        let consumed_newline = usize::try_from(position.byte())
            .ok()
            .and_then(|end| end.checked_sub(1))
            .and_then(|last| bytes.get(last))
            .is_some_and(|b| *b == b'\n');
        let end_line = position.line() - u64::from(consumed_newline);
        let inner_newlines: u64 = record.iter().map(|f| f.matches('\n').count() as u64).sum();
        let start_line = end_line.saturating_sub(inner_newlines);

        for _ in next_line..start_line {
            grid.push(Vec::new());
        }
        next_line = end_line + 1;

        grid.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }
    Ok(grid)
}

/// Semicolon-separated exports are common in locales with a decimal comma.
fn sniff_delimiter(bytes: &[u8]) -> u8 {
    let first_line = bytes.split(|b| *b == b'\n').next().unwrap_or_default();
    let commas = first_line.iter().filter(|b| **b == b',').count();
    let semicolons = first_line.iter().filter(|b| **b == b';').count();
    if semicolons > commas { b';' } else { b',' }
}

fn read_workbook(bytes: &[u8]) -> MergeResult<Vec<Vec<Cell>>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| MergeError::malformed_file(e.to_string()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| MergeError::malformed_file("workbook has no worksheets"))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| MergeError::malformed_file(format!("sheet '{sheet_name}': {e}")))?;

    // Range coordinates are relative to the first used cell; pad back to A1 so
    // user-facing row numbers line up with the sheet.
    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut grid: Vec<Vec<Cell>> = vec![Vec::new(); row_offset];
    for row in range.rows() {
        let mut cells = vec![Cell::Empty; col_offset];
        cells.extend(row.iter().map(data_to_cell));
        grid.push(cells);
    }
    Ok(grid)
}

fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => Cell::Text(dt.to_string()),
        Data::DateTimeIso(s) => Cell::Text(s.clone()),
        Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => Cell::Text(e.to_string()),
    }
}
