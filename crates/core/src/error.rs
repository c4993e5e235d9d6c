//! Mail-merge error model.

use thiserror::Error;

/// Result type used across the merge pipeline.
pub type MergeResult<T> = Result<T, MergeError>;

/// Pipeline-level error.
///
/// Every variant is an *expected* condition the host surfaces to the user
/// (bad row number, unknown column, unreadable upload, no matches). None of
/// them invalidates state loaded by earlier, successful steps.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MergeError {
    /// Start rows are 1-based; zero is never valid.
    #[error("start row must be 1 or greater (got {start_row})")]
    InvalidStartRow { start_row: usize },

    /// The declared header row does not exist in the sheet.
    #[error("header row {header_row} does not exist (sheet has {available_rows} rows)")]
    MissingHeaderRow {
        /// 1-based header row number.
        header_row: usize,
        available_rows: usize,
    },

    /// A mapped column is not present in the sheet's header row.
    #[error("column '{column}' not found in {sheet} sheet")]
    UnknownColumn { sheet: String, column: String },

    /// The uploaded bytes could not be parsed as a spreadsheet at all.
    #[error("file could not be read: {0}")]
    MalformedFile(String),

    /// Grouping produced no groups.
    #[error(
        "no matches: {recipients} recipients and {invoices} invoices produced no groups under {policy}; check the key columns and join policy"
    )]
    NoOverlap {
        policy: String,
        recipients: usize,
        invoices: usize,
    },

    /// Configuration or request input failed validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The recipient repository failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl MergeError {
    pub fn invalid_start_row(start_row: usize) -> Self {
        Self::InvalidStartRow { start_row }
    }

    pub fn missing_header_row(header_row: usize, available_rows: usize) -> Self {
        Self::MissingHeaderRow {
            header_row,
            available_rows,
        }
    }

    pub fn unknown_column(sheet: impl Into<String>, column: impl Into<String>) -> Self {
        Self::UnknownColumn {
            sheet: sheet.into(),
            column: column.into(),
        }
    }

    pub fn malformed_file(msg: impl Into<String>) -> Self {
        Self::MalformedFile(msg.into())
    }

    pub fn no_overlap(policy: impl Into<String>, recipients: usize, invoices: usize) -> Self {
        Self::NoOverlap {
            policy: policy.into(),
            recipients,
            invoices,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Stable machine-readable code for the error (used by HTTP hosts).
    pub fn code(&self) -> &'static str {
        match self {
            MergeError::InvalidStartRow { .. } => "invalid_start_row",
            MergeError::MissingHeaderRow { .. } => "missing_header_row",
            MergeError::UnknownColumn { .. } => "unknown_column",
            MergeError::MalformedFile(_) => "malformed_file",
            MergeError::NoOverlap { .. } => "no_matches",
            MergeError::Validation(_) => "validation_error",
            MergeError::Storage(_) => "storage_error",
        }
    }
}
