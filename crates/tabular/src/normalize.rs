//! Tabular row normalizer: raw rows → trimmed string maps.
//!
//! Row numbers in this module are 1-based, as the user sees them in a
//! spreadsheet. For a grid, the header row is `start_row - 1` (or row 1 when
//! `start_row` is 1) and data begins at `start_row`. With `start_row == 1` the
//! header row is also the first data row.

use mailmerge_core::{FieldMap, MergeError, MergeResult};
use serde::{Deserialize, Serialize};

use crate::cell::{Cell, SheetInput};

/// Normalized sheet: trimmed header names plus one field map per data row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedSheet {
    /// Header names in column order. Blank header cells keep an empty name.
    pub headers: Vec<String>,
    pub rows: Vec<FieldMap>,
}

impl NormalizedSheet {
    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl From<NormalizedSheet> for SheetInput {
    /// Re-feed a normalized sheet as keyed input (header already applied).
    fn from(sheet: NormalizedSheet) -> Self {
        SheetInput::Keyed {
            headers: sheet.headers,
            rows: sheet
                .rows
                .into_iter()
                .map(|row| row.into_iter().map(|(k, v)| (k, Cell::Text(v))).collect())
                .collect(),
        }
    }
}

/// Normalize raw reader output into trimmed string rows.
///
/// Fails with `MissingHeaderRow` when the header row lies past the end of the
/// sheet. A sheet that has a header but no rows at or after `start_row` is not
/// an error: the result simply has no rows.
pub fn normalize(input: &SheetInput, start_row: usize) -> MergeResult<NormalizedSheet> {
    if start_row == 0 {
        return Err(MergeError::invalid_start_row(start_row));
    }

    match input {
        SheetInput::Grid(grid) => normalize_grid(grid, start_row),
        SheetInput::Keyed { headers, rows } => Ok(normalize_keyed(headers, rows, start_row)),
    }
}

fn normalize_grid(grid: &[Vec<Cell>], start_row: usize) -> MergeResult<NormalizedSheet> {
    let header_index = if start_row > 1 { start_row - 2 } else { 0 };
    if grid.len() <= header_index {
        return Err(MergeError::missing_header_row(header_index + 1, grid.len()));
    }

    let columns: Vec<String> = grid[header_index]
        .iter()
        .map(|cell| cell.to_text().trim().to_string())
        .collect();

    // A repeated header maps to a single field; the rightmost column wins.
    let mut headers: Vec<String> = Vec::new();
    for column in &columns {
        push_unique(&mut headers, column);
    }

    if grid.len() < start_row {
        return Ok(NormalizedSheet {
            headers,
            rows: Vec::new(),
        });
    }

    let rows = grid[start_row - 1..]
        .iter()
        .map(|raw| {
            let mut row = FieldMap::new();
            for (index, header) in columns.iter().enumerate() {
                let value = raw
                    .get(index)
                    .map(|cell| cell.to_text().trim().to_string())
                    .unwrap_or_default();
                row.insert(header.clone(), value);
            }
            row
        })
        .collect();

    Ok(NormalizedSheet { headers, rows })
}

fn normalize_keyed(
    headers: &[String],
    rows: &[std::collections::BTreeMap<String, Cell>],
    start_row: usize,
) -> NormalizedSheet {
    // Keyed row `i` corresponds to sheet row `i + 2` (row 1 holds the header).
    let skip = start_row.saturating_sub(2);

    let mut header_names: Vec<String> = Vec::new();
    for h in headers {
        push_unique(&mut header_names, h.trim());
    }
    if header_names.is_empty() {
        for row in rows {
            for key in row.keys() {
                push_unique(&mut header_names, key.trim());
            }
        }
    }

    let rows = rows
        .iter()
        .skip(skip)
        .map(|raw| {
            let mut row: FieldMap = header_names
                .iter()
                .map(|h| (h.clone(), String::new()))
                .collect();
            for (key, cell) in raw {
                row.insert(key.trim().to_string(), cell.to_text().trim().to_string());
            }
            row
        })
        .collect();

    NormalizedSheet {
        headers: header_names,
        rows,
    }
}

fn push_unique(names: &mut Vec<String>, name: &str) {
    if !names.iter().any(|n| n == name) {
        names.push(name.to_string());
    }
}
