use chrono::{DateTime, Utc};
use mailmerge_core::{MergeError, MergeResult, Recipient};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use tokio::sync::Mutex;

use super::{RecipientRepository, StoredRecipients};

/// SQLite-backed recipient repository.
///
/// Keeps a single snapshot row (`id = 1`) holding the list as JSON. The table
/// is created on first use.
#[derive(Debug)]
pub struct SqliteRecipientRepository {
    pool: SqlitePool,
    schema_ready: Mutex<bool>,
}

impl SqliteRecipientRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            schema_ready: Mutex::new(false),
        }
    }

    /// Open a pool for `url` (e.g. `sqlite://mailmerge.db?mode=rwc`).
    pub async fn connect(url: &str) -> MergeResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await
            .map_err(|e| storage("connect", e))?;
        Ok(Self::new(pool))
    }

    async fn ensure_schema(&self) -> MergeResult<()> {
        let mut ready = self.schema_ready.lock().await;
        if *ready {
            return Ok(());
        }

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS recipient_snapshot (
                id         INTEGER PRIMARY KEY CHECK (id = 1),
                recipients TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| storage("create recipient_snapshot", e))?;

        *ready = true;
        Ok(())
    }
}

#[async_trait::async_trait]
impl RecipientRepository for SqliteRecipientRepository {
    async fn load(&self) -> MergeResult<Option<StoredRecipients>> {
        self.ensure_schema().await?;

        let row = sqlx::query("SELECT recipients, updated_at FROM recipient_snapshot WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage("load recipients", e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let json: String = row.try_get("recipients").map_err(|e| storage("read recipients", e))?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(|e| storage("read updated_at", e))?;
        let recipients: Vec<Recipient> =
            serde_json::from_str(&json).map_err(|e| storage("decode recipients", e))?;

        Ok(Some(StoredRecipients { recipients, updated_at }))
    }

    async fn save(&self, recipients: &[Recipient], updated_at: DateTime<Utc>) -> MergeResult<()> {
        self.ensure_schema().await?;

        let json = serde_json::to_string(recipients).map_err(|e| storage("encode recipients", e))?;
        sqlx::query(
            r#"
            INSERT INTO recipient_snapshot (id, recipients, updated_at)
            VALUES (1, ?1, ?2)
            ON CONFLICT (id) DO UPDATE SET
                recipients = excluded.recipients,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(json)
        .bind(updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| storage("save recipients", e))?;

        tracing::info!(recipients = recipients.len(), %updated_at, "recipients saved");
        Ok(())
    }

    async fn clear(&self) -> MergeResult<()> {
        self.ensure_schema().await?;

        sqlx::query("DELETE FROM recipient_snapshot")
            .execute(&self.pool)
            .await
            .map_err(|e| storage("clear recipients", e))?;
        Ok(())
    }
}

fn storage(op: &str, err: impl std::fmt::Display) -> MergeError {
    MergeError::storage(format!("{op}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mailmerge_core::{FieldMap, JoinKey};

    async fn repo() -> SqliteRecipientRepository {
        SqliteRecipientRepository::connect("sqlite::memory:").await.unwrap()
    }

    fn recipients() -> Vec<Recipient> {
        let mut fields = FieldMap::new();
        fields.insert("CODIGO".into(), "P1".into());
        vec![
            Recipient::new(JoinKey::new("001"), "Acme", vec!["a@acme.com".into(), "b@acme.com".into()])
                .with_fields(fields),
            Recipient::new(JoinKey::new("002"), "Beta", vec![]),
        ]
    }

    #[tokio::test]
    async fn empty_store_loads_none() {
        assert_eq!(repo().await.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn save_then_load_round_trips_snapshot() {
        let repo = repo().await;
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        repo.save(&recipients(), at).await.unwrap();

        let stored = repo.load().await.unwrap().unwrap();
        assert_eq!(stored.recipients, recipients());
        assert_eq!(stored.updated_at, at);
    }

    #[tokio::test]
    async fn save_replaces_previous_list() {
        let repo = repo().await;
        let first = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2024, 5, 2, 9, 0, 0).unwrap();
        repo.save(&recipients(), first).await.unwrap();
        repo.save(&recipients()[1..], second).await.unwrap();

        let stored = repo.load().await.unwrap().unwrap();
        assert_eq!(stored.recipients.len(), 1);
        assert_eq!(stored.updated_at, second);
    }

    #[tokio::test]
    async fn clear_removes_snapshot() {
        let repo = repo().await;
        repo.save(&recipients(), Utc::now()).await.unwrap();
        repo.clear().await.unwrap();
        assert_eq!(repo.load().await.unwrap(), None);
    }
}
