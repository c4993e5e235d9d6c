use std::sync::Arc;

use anyhow::Context;
use mailmerge_ai::{HttpTemplateRewriter, TemplateRewriter};
use mailmerge_drafts::MailtoDispatcher;
use mailmerge_infra::{InMemoryRecipientRepository, RecipientRepository, SqliteRecipientRepository};
use mailmerge_workflow::{MergeConfig, MergeSession};
use tokio::sync::Mutex;

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://mailmerge.db?mode=rwc";

/// Process settings read from the environment.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub bind: String,
    /// `None` keeps recipients in memory only.
    pub database_url: Option<String>,
    pub rewrite_url: Option<String>,
    pub merge: MergeConfig,
}

impl ApiSettings {
    pub fn from_env() -> anyhow::Result<Self> {
        let bind = std::env::var("MAILMERGE_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());

        let database_url = std::env::var("MAILMERGE_DATABASE_URL").unwrap_or_else(|_| {
            tracing::warn!(default = DEFAULT_DATABASE_URL, "MAILMERGE_DATABASE_URL not set; using local file");
            DEFAULT_DATABASE_URL.to_string()
        });

        let rewrite_url = std::env::var("MAILMERGE_REWRITE_URL").ok().filter(|u| !u.trim().is_empty());
        if rewrite_url.is_none() {
            tracing::warn!("MAILMERGE_REWRITE_URL not set; template rewrite disabled");
        }

        let merge = MergeConfig::from_env().context("invalid merge configuration")?;

        Ok(Self {
            bind,
            database_url: Some(database_url),
            rewrite_url,
            merge,
        })
    }

    /// In-memory settings for tests and local experiments.
    pub fn ephemeral(merge: MergeConfig) -> Self {
        Self {
            bind: "127.0.0.1:0".to_string(),
            database_url: None,
            rewrite_url: None,
            merge,
        }
    }
}

/// Shared state behind every handler: one merge session plus collaborators.
pub struct AppServices {
    session: Mutex<MergeSession>,
    rewriter: Option<Arc<dyn TemplateRewriter>>,
    dispatcher: MailtoDispatcher,
}

impl AppServices {
    pub fn session(&self) -> &Mutex<MergeSession> {
        &self.session
    }

    pub fn rewriter(&self) -> Option<&Arc<dyn TemplateRewriter>> {
        self.rewriter.as_ref()
    }

    pub fn dispatcher(&self) -> &MailtoDispatcher {
        &self.dispatcher
    }
}

/// Wire repository, rewriter and session, then restore saved recipients.
pub async fn build_services(settings: &ApiSettings) -> anyhow::Result<AppServices> {
    let repository: Arc<dyn RecipientRepository> = match settings.database_url.as_deref() {
        Some(url) => Arc::new(
            SqliteRecipientRepository::connect(url)
                .await
                .with_context(|| format!("failed to open recipient store at {url}"))?,
        ),
        None => Arc::new(InMemoryRecipientRepository::new()),
    };

    let rewriter = settings
        .rewrite_url
        .as_ref()
        .map(|url| Arc::new(HttpTemplateRewriter::new(url.clone())) as Arc<dyn TemplateRewriter>);

    let mut session =
        MergeSession::new(settings.merge.clone(), repository).context("failed to start merge session")?;
    let restored = session.restore_recipients().await.context("failed to restore recipients")?;
    tracing::info!(restored, policy = %settings.merge.join_policy, "merge session ready");

    Ok(AppServices {
        session: Mutex::new(session),
        rewriter,
        dispatcher: MailtoDispatcher,
    })
}
