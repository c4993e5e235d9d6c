//! `mailmerge-workflow`: the wizard around the merge core.
//!
//! Owns one run's state (uploaded rows, template, groups, drafts) and moves
//! through [`WizardStep`]s only after each stage's core operation succeeds.
//! Recipients persist through an injected [`mailmerge_infra::RecipientRepository`].

pub mod config;
pub mod error;
pub mod session;
pub mod step;

pub use config::{MergeConfig, DEFAULT_BODY, DEFAULT_SUBJECT};
pub use error::{WorkflowError, WorkflowResult};
pub use session::{MergeSession, Upload};
pub use step::WizardStep;
