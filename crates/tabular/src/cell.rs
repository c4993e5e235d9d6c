//! Raw sheet input as handed over by a spreadsheet reader.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single raw cell value.
///
/// Deserializes from plain JSON scalars (`null`, booleans, numbers, strings),
/// so hosts can post grids straight from a browser-side reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Cell {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Cell {
    /// Stringify the cell the way a formatted-text sheet read would.
    ///
    /// Integral numbers print without a fractional part so tax IDs stored as
    /// numbers survive (`20551234567`, not `20551234567.0`).
    pub fn to_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Bool(true) => "TRUE".to_string(),
            Cell::Bool(false) => "FALSE".to_string(),
            Cell::Number(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{n}")
                }
            }
            Cell::Text(s) => s.clone(),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

/// Sheet contents before normalization.
///
/// Readers either return the raw 2-D grid (header row included) or rows that
/// are already keyed by header name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetInput {
    Grid(Vec<Vec<Cell>>),
    Keyed {
        #[serde(default)]
        headers: Vec<String>,
        rows: Vec<BTreeMap<String, Cell>>,
    },
}

impl SheetInput {
    /// Number of rows the reader produced.
    pub fn row_count(&self) -> usize {
        match self {
            SheetInput::Grid(rows) => rows.len(),
            SheetInput::Keyed { rows, .. } => rows.len(),
        }
    }
}
