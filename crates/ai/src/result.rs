use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A revised template returned by a rewrite collaborator.
///
/// This is a *suggestion*: nothing is applied to the session until the
/// placeholder check passes and the caller stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteOutcome {
    pub template: String,

    /// Placeholders present in both the original and the revision.
    pub placeholders: Vec<String>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RewriteError {
    #[error("template is empty")]
    EmptyTemplate,

    #[error("rewrite dropped placeholders: {}", .0.join(", "))]
    PlaceholdersDropped(Vec<String>),

    #[error("rewrite service unavailable: {0}")]
    Unavailable(String),

    #[error("rewrite service returned an invalid response: {0}")]
    InvalidResponse(String),
}

impl RewriteError {
    pub fn code(&self) -> &'static str {
        match self {
            RewriteError::EmptyTemplate => "empty_template",
            RewriteError::PlaceholdersDropped(_) => "placeholders_dropped",
            RewriteError::Unavailable(_) => "rewrite_unavailable",
            RewriteError::InvalidResponse(_) => "rewrite_invalid_response",
        }
    }
}
