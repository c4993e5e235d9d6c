use std::sync::RwLock;

use chrono::{DateTime, Utc};
use mailmerge_core::{MergeError, MergeResult, Recipient};

use super::{RecipientRepository, StoredRecipients};

/// In-memory recipient repository for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryRecipientRepository {
    inner: RwLock<Option<StoredRecipients>>,
}

impl InMemoryRecipientRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seeded repository, as if `save` had already run.
    pub fn with(recipients: Vec<Recipient>, updated_at: DateTime<Utc>) -> Self {
        Self {
            inner: RwLock::new(Some(StoredRecipients { recipients, updated_at })),
        }
    }
}

#[async_trait::async_trait]
impl RecipientRepository for InMemoryRecipientRepository {
    async fn load(&self) -> MergeResult<Option<StoredRecipients>> {
        let guard = self
            .inner
            .read()
            .map_err(|_| MergeError::storage("recipient store lock poisoned"))?;
        Ok(guard.clone())
    }

    async fn save(&self, recipients: &[Recipient], updated_at: DateTime<Utc>) -> MergeResult<()> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| MergeError::storage("recipient store lock poisoned"))?;
        *guard = Some(StoredRecipients {
            recipients: recipients.to_vec(),
            updated_at,
        });
        Ok(())
    }

    async fn clear(&self) -> MergeResult<()> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| MergeError::storage("recipient store lock poisoned"))?;
        *guard = None;
        Ok(())
    }
}
