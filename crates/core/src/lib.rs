//! `mailmerge-core`: shared record types and error model.
//!
//! This crate contains **pure data** primitives (no I/O). Every other crate in
//! the workspace speaks in these types.

pub mod error;
pub mod key;
pub mod record;

pub use error::{MergeError, MergeResult};
pub use key::JoinKey;
pub use record::{split_emails, FieldMap, InvoiceRecord, Recipient};
