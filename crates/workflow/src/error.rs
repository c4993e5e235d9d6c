use mailmerge_ai::RewriteError;
use mailmerge_core::{JoinKey, MergeError};
use mailmerge_drafts::TransportError;
use mailmerge_template::TemplateError;
use thiserror::Error;

use crate::step::WizardStep;

pub type WorkflowResult<T> = Result<T, WorkflowError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("cannot {operation} during the {step} step")]
    InvalidStep { operation: &'static str, step: WizardStep },

    #[error("upload both recipients and invoices before processing (recipients: {recipients}, invoices: {invoices})")]
    MissingInputs { recipients: usize, invoices: usize },

    #[error("no draft for key '{0}'")]
    UnknownGroup(JoinKey),

    #[error("export failed: {0}")]
    Export(String),
}

impl WorkflowError {
    pub fn code(&self) -> &'static str {
        match self {
            WorkflowError::Merge(e) => e.code(),
            WorkflowError::Template(_) => "template_error",
            WorkflowError::Rewrite(e) => e.code(),
            WorkflowError::Transport(_) => "transport_error",
            WorkflowError::InvalidStep { .. } => "invalid_step",
            WorkflowError::MissingInputs { .. } => "missing_inputs",
            WorkflowError::UnknownGroup(_) => "not_found",
            WorkflowError::Export(_) => "export_error",
        }
    }
}
