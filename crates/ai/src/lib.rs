//! `mailmerge-ai`
//!
//! **Responsibility:** Optional template rewrite boundary.
//!
//! This crate is intentionally **not** part of the merge core:
//! - It never touches recipients, invoices or groups.
//! - It only proposes new template text; the caller decides whether to keep it.
//! - A revision that loses any `{{...}}` placeholder is rejected.

pub mod http;
pub mod result;
pub mod rewrite;

pub use http::HttpTemplateRewriter;
pub use result::{RewriteError, RewriteOutcome};
pub use rewrite::{ensure_placeholders_preserved, rewrite_checked, RewriteRequest, TemplateRewriter};
