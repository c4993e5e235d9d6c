//! `mailmerge-drafts`: rendered emails, dispatch bookkeeping and export.

pub mod dispatch;
pub mod draft;
pub mod export;
pub mod tracker;

pub use dispatch::{dispatch_batch, mailto_link, BatchReport, DraftDispatcher, MailtoDispatcher, TransportError};
pub use draft::{build_draft, build_drafts, Draft, DraftTemplate};
pub use export::{export_csv, EXPORT_HEADER};
pub use tracker::{DispatchProgress, DispatchTracker};
