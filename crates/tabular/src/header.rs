//! Canonical header casing.
//!
//! Imports disagree on casing (`RUC` vs `ruc`), so header names are brought to
//! one canonical case right after normalization, and configured column names
//! go through the same function before lookup.

use mailmerge_core::FieldMap;
use serde::{Deserialize, Serialize};

use crate::normalize::NormalizedSheet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderCase {
    Preserve,
    #[default]
    Upper,
    Lower,
}

impl HeaderCase {
    pub fn apply(&self, name: &str) -> String {
        let name = name.trim();
        match self {
            HeaderCase::Preserve => name.to_string(),
            HeaderCase::Upper => name.to_uppercase(),
            HeaderCase::Lower => name.to_lowercase(),
        }
    }
}

/// Rewrite headers and row keys to `case`.
///
/// Headers that collide after recasing merge into one column; the value of
/// the header that sorts last under the original spelling wins.
pub fn canonicalize(sheet: NormalizedSheet, case: HeaderCase) -> NormalizedSheet {
    if case == HeaderCase::Preserve {
        return sheet;
    }

    let mut headers: Vec<String> = Vec::with_capacity(sheet.headers.len());
    for h in &sheet.headers {
        let canonical = case.apply(h);
        if !headers.contains(&canonical) {
            headers.push(canonical);
        }
    }

    let rows = sheet
        .rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|(k, v)| (case.apply(&k), v))
                .collect::<FieldMap>()
        })
        .collect();

    NormalizedSheet { headers, rows }
}
