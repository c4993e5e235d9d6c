//! Persistence for the imported recipient list.
//!
//! Recipients are the only input kept across workflow runs; invoices and
//! templates live for one run only. The join engine never sees this layer.

mod in_memory;
mod sqlite;

pub use in_memory::InMemoryRecipientRepository;
pub use sqlite::SqliteRecipientRepository;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mailmerge_core::{MergeResult, Recipient};
use serde::{Deserialize, Serialize};

/// The saved recipient list and when it was uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecipients {
    pub recipients: Vec<Recipient>,
    pub updated_at: DateTime<Utc>,
}

/// Load/save/clear capability injected into the workflow.
///
/// `save` replaces the whole list; there is no per-recipient update.
#[async_trait::async_trait]
pub trait RecipientRepository: Send + Sync {
    /// `None` when nothing has been saved (or after `clear`).
    async fn load(&self) -> MergeResult<Option<StoredRecipients>>;

    async fn save(&self, recipients: &[Recipient], updated_at: DateTime<Utc>) -> MergeResult<()>;

    async fn clear(&self) -> MergeResult<()>;
}

#[async_trait::async_trait]
impl<R> RecipientRepository for Arc<R>
where
    R: RecipientRepository + ?Sized,
{
    async fn load(&self) -> MergeResult<Option<StoredRecipients>> {
        (**self).load().await
    }

    async fn save(&self, recipients: &[Recipient], updated_at: DateTime<Utc>) -> MergeResult<()> {
        (**self).save(recipients, updated_at).await
    }

    async fn clear(&self) -> MergeResult<()> {
        (**self).clear().await
    }
}
