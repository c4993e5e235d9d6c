//! One merge run: uploads, grouping, template editing and dispatch.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mailmerge_ai::{rewrite_checked, RewriteOutcome, RewriteRequest, TemplateRewriter};
use mailmerge_core::{InvoiceRecord, JoinKey, MergeError, Recipient};
use mailmerge_drafts::{
    build_drafts, dispatch_batch, export_csv, BatchReport, DispatchProgress, DispatchTracker, Draft, DraftDispatcher,
    DraftTemplate,
};
use mailmerge_grouping::{group, GroupSet};
use mailmerge_infra::RecipientRepository;
use mailmerge_tabular::{import_invoices, import_recipients, SheetFormat};
use mailmerge_template::{PatternItemRenderer, TemplateEngine};

use crate::config::MergeConfig;
use crate::error::{WorkflowError, WorkflowResult};
use crate::step::WizardStep;

/// An uploaded file as received from the host.
#[derive(Debug, Clone, Copy)]
pub struct Upload<'a> {
    pub bytes: &'a [u8],
    pub file_name: Option<&'a str>,
    /// Overrides the configured start row for this file.
    pub start_row: Option<usize>,
}

impl<'a> Upload<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            file_name: None,
            start_row: None,
        }
    }

    pub fn named(mut self, file_name: &'a str) -> Self {
        self.file_name = Some(file_name);
        self
    }

    pub fn start_row(mut self, start_row: usize) -> Self {
        self.start_row = Some(start_row);
        self
    }

    fn format(&self) -> SheetFormat {
        SheetFormat::detect(self.file_name, self.bytes)
    }
}

/// State of one wizard run.
///
/// Every transition happens only after the stage's core operation
/// succeeded; a failed upload leaves the previously loaded data untouched.
pub struct MergeSession {
    config: MergeConfig,
    engine: TemplateEngine,
    renderer: PatternItemRenderer,
    repository: Arc<dyn RecipientRepository>,

    step: WizardStep,
    recipients: Vec<Recipient>,
    recipients_updated_at: Option<DateTime<Utc>>,
    invoices: Vec<InvoiceRecord>,
    template: DraftTemplate,
    groups: Option<GroupSet>,
    drafts: Vec<Draft>,
    tracker: DispatchTracker,
}

impl MergeSession {
    pub fn new(config: MergeConfig, repository: Arc<dyn RecipientRepository>) -> WorkflowResult<Self> {
        config.validate()?;
        Ok(Self {
            engine: config.template_engine(),
            renderer: config.item_renderer(),
            template: DraftTemplate::new(config.subject_template.clone(), config.body_template.clone()),
            config,
            repository,
            step: WizardStep::Upload,
            recipients: Vec::new(),
            recipients_updated_at: None,
            invoices: Vec::new(),
            groups: None,
            drafts: Vec::new(),
            tracker: DispatchTracker::default(),
        })
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn recipients(&self) -> &[Recipient] {
        &self.recipients
    }

    pub fn recipients_updated_at(&self) -> Option<DateTime<Utc>> {
        self.recipients_updated_at
    }

    pub fn invoices(&self) -> &[InvoiceRecord] {
        &self.invoices
    }

    pub fn template(&self) -> &DraftTemplate {
        &self.template
    }

    pub fn groups(&self) -> Option<&GroupSet> {
        self.groups.as_ref()
    }

    fn require(&self, operation: &'static str, allowed: &[WizardStep]) -> WorkflowResult<()> {
        if allowed.contains(&self.step) {
            Ok(())
        } else {
            Err(WorkflowError::InvalidStep {
                operation,
                step: self.step,
            })
        }
    }

    /// Load the saved recipient list, if any. Returns how many were restored.
    pub async fn restore_recipients(&mut self) -> WorkflowResult<usize> {
        match self.repository.load().await? {
            Some(stored) => {
                self.recipients = stored.recipients;
                self.recipients_updated_at = Some(stored.updated_at);
                tracing::info!(recipients = self.recipients.len(), updated_at = %stored.updated_at, "recipients restored");
            }
            None => {
                self.recipients.clear();
                self.recipients_updated_at = None;
            }
        }
        Ok(self.recipients.len())
    }

    /// Parse and persist a recipients file, replacing the current list.
    pub async fn upload_recipients(&mut self, upload: Upload<'_>) -> WorkflowResult<usize> {
        self.require("upload recipients", &[WizardStep::Upload])?;

        let start_row = upload.start_row.unwrap_or(self.config.start_row_recipients);
        let parsed = import_recipients(upload.bytes, upload.format(), start_row, &self.config.column_mapping())?;

        let now = Utc::now();
        self.repository.save(&parsed, now).await?;

        tracing::info!(recipients = parsed.len(), file = upload.file_name.unwrap_or("-"), "recipients uploaded");
        self.recipients = parsed;
        self.recipients_updated_at = Some(now);
        Ok(self.recipients.len())
    }

    /// Parse an invoices file, replacing the current list. Invoices are not persisted.
    pub fn upload_invoices(&mut self, upload: Upload<'_>) -> WorkflowResult<usize> {
        self.require("upload invoices", &[WizardStep::Upload])?;

        let start_row = upload.start_row.unwrap_or(self.config.start_row_invoices);
        let parsed = import_invoices(upload.bytes, upload.format(), start_row, &self.config.column_mapping())?;

        tracing::info!(invoices = parsed.len(), file = upload.file_name.unwrap_or("-"), "invoices uploaded");
        self.invoices = parsed;
        Ok(self.invoices.len())
    }

    pub async fn clear_recipients(&mut self) -> WorkflowResult<()> {
        self.require("clear recipients", &[WizardStep::Upload])?;
        self.repository.clear().await?;
        self.recipients.clear();
        self.recipients_updated_at = None;
        tracing::info!("recipients cleared");
        Ok(())
    }

    /// Replace the body (and optionally the subject). Not allowed once drafts exist.
    pub fn set_template(&mut self, body: impl Into<String>, subject: Option<String>) -> WorkflowResult<()> {
        self.require("edit the template", &[WizardStep::Upload, WizardStep::Preview])?;
        self.template.body = body.into();
        if let Some(subject) = subject {
            self.template.subject = subject;
        }
        Ok(())
    }

    /// Ask `rewriter` for a revised body and keep it only if no placeholder was lost.
    pub async fn rewrite_template<R>(&mut self, rewriter: &R, guidance: &str) -> WorkflowResult<RewriteOutcome>
    where
        R: TemplateRewriter + ?Sized,
    {
        self.require("rewrite the template", &[WizardStep::Upload, WizardStep::Preview])?;
        let request = RewriteRequest::new(self.template.body.clone(), guidance);
        let outcome = rewrite_checked(rewriter, &request).await?;
        self.template.body = outcome.template.clone();
        Ok(outcome)
    }

    /// Group the uploaded data and move to the preview step.
    pub fn process(&mut self) -> WorkflowResult<&GroupSet> {
        self.require("process", &[WizardStep::Upload])?;
        if self.recipients.is_empty() || self.invoices.is_empty() {
            return Err(WorkflowError::MissingInputs {
                recipients: self.recipients.len(),
                invoices: self.invoices.len(),
            });
        }

        let policy = self.config.join_policy;
        let groups = group(&self.recipients, &self.invoices, policy);
        if groups.is_empty() {
            return Err(MergeError::no_overlap(policy.as_str(), self.recipients.len(), self.invoices.len()).into());
        }

        tracing::info!(groups = groups.len(), %policy, "processed");
        self.drafts.clear();
        self.tracker = DispatchTracker::default();
        self.step = WizardStep::Preview;
        Ok(self.groups.insert(groups))
    }

    /// Render drafts for the current groups without leaving the preview.
    pub fn preview(&self) -> WorkflowResult<Vec<Draft>> {
        self.require("preview", &[WizardStep::Preview, WizardStep::Generate])?;
        let groups = self.groups.as_ref().ok_or(WorkflowError::InvalidStep {
            operation: "preview",
            step: self.step,
        })?;
        Ok(build_drafts(&self.engine, groups, &self.template, &self.renderer)?)
    }

    /// Render the final drafts and move to the generate step.
    pub fn generate(&mut self) -> WorkflowResult<&[Draft]> {
        self.require("generate", &[WizardStep::Preview])?;
        let drafts = self.preview()?;
        self.tracker = DispatchTracker::for_drafts(&drafts);
        self.drafts = drafts;
        self.step = WizardStep::Generate;
        Ok(&self.drafts)
    }

    pub fn drafts(&self) -> WorkflowResult<&[Draft]> {
        self.require("list drafts", &[WizardStep::Generate])?;
        Ok(&self.drafts)
    }

    pub fn draft(&self, key: &JoinKey) -> WorkflowResult<&Draft> {
        self.drafts()?
            .iter()
            .find(|d| &d.group_key == key)
            .ok_or_else(|| WorkflowError::UnknownGroup(key.clone()))
    }

    pub fn is_dispatched(&self, key: &JoinKey) -> bool {
        self.tracker.is_dispatched(key)
    }

    pub fn progress(&self) -> DispatchProgress {
        self.tracker.progress()
    }

    /// Record that the caller dispatched `key` by its own means.
    pub fn mark_dispatched(&mut self, key: &JoinKey) -> WorkflowResult<DispatchProgress> {
        self.require("mark drafts", &[WizardStep::Generate])?;
        if !self.tracker.mark_dispatched(key) {
            return Err(WorkflowError::UnknownGroup(key.clone()));
        }
        Ok(self.tracker.progress())
    }

    /// Dispatch one draft and mark it on success. Returns the transport receipt.
    pub async fn dispatch<D>(&mut self, key: &JoinKey, dispatcher: &D) -> WorkflowResult<String>
    where
        D: DraftDispatcher + ?Sized,
    {
        let draft = self.draft(key)?.clone();
        let receipt = dispatcher.dispatch(&draft).await?;
        self.tracker.mark_dispatched(key);
        Ok(receipt)
    }

    /// Dispatch every draft not yet dispatched.
    pub async fn dispatch_all<D>(&mut self, dispatcher: &D) -> WorkflowResult<BatchReport>
    where
        D: DraftDispatcher + ?Sized,
    {
        self.require("dispatch", &[WizardStep::Generate])?;
        Ok(dispatch_batch(dispatcher, &self.drafts, &mut self.tracker).await)
    }

    pub fn export_csv(&self) -> WorkflowResult<Vec<u8>> {
        let drafts = self.drafts()?;
        export_csv(drafts).map_err(|e| WorkflowError::Export(e.to_string()))
    }

    /// Generate → Preview keeps the groups; Preview → Upload drops them.
    pub fn back(&mut self) -> WorkflowResult<WizardStep> {
        let previous = self.step.back().ok_or(WorkflowError::InvalidStep {
            operation: "go back",
            step: self.step,
        })?;
        if previous == WizardStep::Upload {
            self.groups = None;
        }
        self.drafts.clear();
        self.tracker = DispatchTracker::default();
        self.step = previous;
        Ok(previous)
    }

    /// Drop invoices, groups and drafts and restore the configured template.
    /// Recipients are kept.
    pub fn start_over(&mut self) {
        self.invoices.clear();
        self.groups = None;
        self.drafts.clear();
        self.tracker = DispatchTracker::default();
        self.template = DraftTemplate::new(self.config.subject_template.clone(), self.config.body_template.clone());
        self.step = WizardStep::Upload;
        tracing::info!(recipients = self.recipients.len(), "session restarted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailmerge_ai::RewriteError;
    use mailmerge_drafts::MailtoDispatcher;
    use mailmerge_infra::InMemoryRecipientRepository;

    const RECIPIENTS: &str = "ruc,nombre,correo\n001,Acme,a@acme.com\n002,Beta,\n";
    const INVOICES: &str = "RUC_EMISOR,RAZON_SOCIAL_EMISOR,TIPO_COMPROBANTE,SERIE_COMPROBANTE,OBSERVACIONES\n\
                            001,ACME SA,Factura,F001-1,dup\n\
                            003,GAMMA SA,Factura,F003-1,error\n\
                            001,ACME SA,Nota,N001-2,dup\n";

    fn session() -> (MergeSession, Arc<InMemoryRecipientRepository>) {
        let repo = Arc::new(InMemoryRecipientRepository::new());
        let session = MergeSession::new(MergeConfig::default(), repo.clone()).unwrap();
        (session, repo)
    }

    async fn loaded() -> MergeSession {
        let (mut s, _) = session();
        s.upload_recipients(Upload::new(RECIPIENTS.as_bytes()).named("r.csv")).await.unwrap();
        s.upload_invoices(Upload::new(INVOICES.as_bytes()).named("i.csv")).unwrap();
        s
    }

    struct Echo;

    #[async_trait::async_trait]
    impl TemplateRewriter for Echo {
        async fn rewrite(&self, request: &RewriteRequest) -> Result<String, RewriteError> {
            Ok(format!("{}\n-- {}", request.template, request.guidance))
        }
    }

    struct Forgetful;

    #[async_trait::async_trait]
    impl TemplateRewriter for Forgetful {
        async fn rewrite(&self, _request: &RewriteRequest) -> Result<String, RewriteError> {
            Ok("Estimados señores".to_string())
        }
    }

    #[tokio::test]
    async fn uploaded_recipients_are_persisted_and_restorable() {
        let (mut s, repo) = session();
        let n = s.upload_recipients(Upload::new(RECIPIENTS.as_bytes()).named("r.csv")).await.unwrap();
        assert_eq!(n, 2);
        assert!(s.recipients_updated_at().is_some());

        let mut other = MergeSession::new(MergeConfig::default(), repo).unwrap();
        assert_eq!(other.restore_recipients().await.unwrap(), 2);
        assert_eq!(other.recipients()[0].display_name, "Acme");
    }

    #[tokio::test]
    async fn failed_upload_keeps_previous_state() {
        let mut s = loaded().await;
        let err = s
            .upload_recipients(Upload::new(b"RUC\n001\n").named("r.csv").start_row(9))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "missing_header_row");
        assert_eq!(s.recipients().len(), 2);

        let err = s.upload_invoices(Upload::new(b"OTRA\nx\n").named("i.csv")).unwrap_err();
        assert_eq!(err.code(), "unknown_column");
        assert_eq!(s.invoices().len(), 3);
    }

    #[tokio::test]
    async fn process_generate_and_dispatch() {
        let mut s = loaded().await;
        let groups = s.process().unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(s.step(), WizardStep::Preview);

        let drafts = s.generate().unwrap();
        assert_eq!(drafts.len(), 2);
        assert!(drafts[0].body.contains("Estimados señores de Acme"));
        assert!(drafts[0].body.contains("Factura - F001-1 - dup\nNota - N001-2 - dup"));
        assert_eq!(drafts[1].recipient_name, "GAMMA SA");
        assert!(!drafts[1].has_email);

        let key = JoinKey::new("001");
        let receipt = s.dispatch(&key, &MailtoDispatcher).await.unwrap();
        assert!(receipt.starts_with("mailto:a@acme.com?subject=Anulaci%C3%B3n"));
        assert_eq!(s.progress().remaining, 1);

        let report = s.dispatch_all(&MailtoDispatcher).await.unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(s.progress().remaining, 0);
    }

    #[tokio::test]
    async fn no_overlap_is_reported_for_inner_join() {
        let repo = Arc::new(InMemoryRecipientRepository::new());
        let config = MergeConfig {
            join_policy: mailmerge_grouping::JoinPolicy::InnerOnMatch,
            ..MergeConfig::default()
        };
        let mut s = MergeSession::new(config, repo).unwrap();
        s.upload_recipients(Upload::new(b"RUC,NOMBRE,CORREO\n999,Zeta,x@y.com\n").named("r.csv")).await.unwrap();
        s.upload_invoices(Upload::new(INVOICES.as_bytes()).named("i.csv")).unwrap();

        let err = s.process().unwrap_err();
        assert_eq!(err.code(), "no_matches");
        assert_eq!(s.step(), WizardStep::Upload);
    }

    #[tokio::test]
    async fn process_requires_both_files() {
        let (mut s, _) = session();
        s.upload_invoices(Upload::new(INVOICES.as_bytes())).unwrap();
        let err = s.process().unwrap_err();
        assert_eq!(err, WorkflowError::MissingInputs { recipients: 0, invoices: 3 });
    }

    #[tokio::test]
    async fn steps_gate_operations() {
        let mut s = loaded().await;
        assert_eq!(s.generate().unwrap_err().code(), "invalid_step");
        assert_eq!(s.back().unwrap_err().code(), "invalid_step");

        s.process().unwrap();
        s.generate().unwrap();
        assert_eq!(s.set_template("x", None).unwrap_err().code(), "invalid_step");
        assert_eq!(
            s.mark_dispatched(&JoinKey::new("nope")).unwrap_err(),
            WorkflowError::UnknownGroup(JoinKey::new("nope"))
        );

        assert_eq!(s.back().unwrap(), WizardStep::Preview);
        assert!(s.groups().is_some());
        assert_eq!(s.back().unwrap(), WizardStep::Upload);
        assert!(s.groups().is_none());
    }

    #[tokio::test]
    async fn start_over_keeps_recipients_only() {
        let mut s = loaded().await;
        s.set_template("Hola {{razon_social_emisor}}", Some("Asunto".into())).unwrap();
        s.process().unwrap();
        s.start_over();

        assert_eq!(s.step(), WizardStep::Upload);
        assert_eq!(s.recipients().len(), 2);
        assert!(s.invoices().is_empty());
        assert_eq!(s.template().subject, "Anulación de comprobantes");
    }

    #[tokio::test]
    async fn clear_recipients_wipes_repository() {
        let (mut s, repo) = session();
        s.upload_recipients(Upload::new(RECIPIENTS.as_bytes())).await.unwrap();
        s.clear_recipients().await.unwrap();
        assert!(s.recipients().is_empty());
        assert_eq!(repo.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn rewrite_applies_only_faithful_revisions() {
        let (mut s, _) = session();
        let out = s.rewrite_template(&Echo, "más formal").await.unwrap();
        assert!(s.template().body.ends_with("-- más formal"));
        assert!(out.placeholders.contains(&"invoices_table".to_string()));

        let before = s.template().body.clone();
        let err = s.rewrite_template(&Forgetful, "").await.unwrap_err();
        assert_eq!(err.code(), "placeholders_dropped");
        assert_eq!(s.template().body, before);
    }

    #[tokio::test]
    async fn export_requires_generated_drafts() {
        let mut s = loaded().await;
        assert_eq!(s.export_csv().unwrap_err().code(), "invalid_step");
        s.process().unwrap();
        s.generate().unwrap();
        let csv = s.export_csv().unwrap();
        assert!(csv.starts_with(b"\xEF\xBB\xBF\"Recipient\""));
    }
}
