//! `mailmerge-tabular`: spreadsheet rows into typed records.
//!
//! Pipeline: bytes → [`read_sheet`] → [`normalize`] → [`canonicalize`] →
//! [`recipients_from_sheet`] / [`invoices_from_sheet`]. Everything except the
//! reader is a pure function over in-memory data.

pub mod cell;
pub mod header;
pub mod mapping;
pub mod normalize;
pub mod reader;

pub use cell::{Cell, SheetInput};
pub use header::{canonicalize, HeaderCase};
pub use mapping::{invoices_from_sheet, recipients_from_sheet, ColumnMapping};
pub use normalize::{normalize, NormalizedSheet};
pub use reader::{read_sheet, SheetFormat};

use mailmerge_core::{InvoiceRecord, MergeResult, Recipient};

/// Normalize + canonicalize raw reader output.
pub fn prepare_sheet(input: &SheetInput, start_row: usize, case: HeaderCase) -> MergeResult<NormalizedSheet> {
    normalize(input, start_row).map(|sheet| canonicalize(sheet, case))
}

/// Read an uploaded recipients file end to end.
pub fn import_recipients(
    bytes: &[u8],
    format: SheetFormat,
    start_row: usize,
    mapping: &ColumnMapping,
) -> MergeResult<Vec<Recipient>> {
    let input = read_sheet(bytes, format)?;
    let sheet = prepare_sheet(&input, start_row, mapping.header_case)?;
    recipients_from_sheet(&sheet, mapping)
}

/// Read an uploaded invoices file end to end.
pub fn import_invoices(
    bytes: &[u8],
    format: SheetFormat,
    start_row: usize,
    mapping: &ColumnMapping,
) -> MergeResult<Vec<InvoiceRecord>> {
    let input = read_sheet(bytes, format)?;
    let sheet = prepare_sheet(&input, start_row, mapping.header_case)?;
    invoices_from_sheet(&sheet, mapping)
}
