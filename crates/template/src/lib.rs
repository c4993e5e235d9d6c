//! `mailmerge-template`: `{{name}}` expansion with one itemized placeholder.
//!
//! Substitution is literal, case-sensitive and single-pass: inserted values
//! are never re-scanned and names are matched verbatim.

pub mod alias;
pub mod item;
pub mod placeholder;
pub mod render;

pub use alias::{AliasTable, RecipientAttribute};
pub use item::{ItemRenderer, PatternItemRenderer, TableRowRenderer};
pub use placeholder::{placeholders, substitute, token, Substituted, TemplateError};
pub use render::{render, ItemsBlock, Rendered, TemplateEngine, DEFAULT_ITEMS_PLACEHOLDER};
