use serde::Deserialize;
use serde_json::json;

use mailmerge_core::Recipient;
use mailmerge_drafts::{DispatchProgress, Draft};
use mailmerge_grouping::Group;
use mailmerge_workflow::MergeSession;

// -------------------------
// Request DTOs
// -------------------------

/// Query string of the raw-body upload endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    pub file_name: Option<String>,
    pub start_row: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct TemplateRequest {
    pub body: String,
    pub subject: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RewriteTemplateRequest {
    #[serde(default)]
    pub guidance: String,
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn recipient_to_json(r: &Recipient) -> serde_json::Value {
    json!({
        "key": r.key,
        "display_name": r.display_name,
        "contact_emails": r.contact_emails,
    })
}

pub fn recipients_to_json(session: &MergeSession) -> serde_json::Value {
    json!({
        "count": session.recipients().len(),
        "updated_at": session.recipients_updated_at().map(|t| t.to_rfc3339()),
        "items": session.recipients().iter().map(recipient_to_json).collect::<Vec<_>>(),
    })
}

pub fn group_to_json(g: &Group) -> serde_json::Value {
    json!({
        "key": g.key,
        "display_name": g.display_name(),
        "origin": g.origin,
        "emails": g.recipient.contact_emails,
        "invoice_count": g.invoices.len(),
        "invoices": g.invoices.iter().map(|i| &i.fields).collect::<Vec<_>>(),
    })
}

pub fn draft_to_json(d: &Draft, dispatched: bool) -> serde_json::Value {
    json!({
        "group_key": d.group_key,
        "recipient_name": d.recipient_name,
        "to": d.to,
        "subject": d.subject,
        "body": d.body,
        "has_email": d.has_email,
        "unresolved": d.unresolved,
        "dispatched": dispatched,
    })
}

pub fn progress_to_json(p: DispatchProgress) -> serde_json::Value {
    json!({
        "total": p.total,
        "dispatched": p.dispatched,
        "remaining": p.remaining,
    })
}

pub fn session_to_json(session: &MergeSession) -> serde_json::Value {
    json!({
        "step": session.step(),
        "step_number": session.step().number(),
        "recipients": session.recipients().len(),
        "invoices": session.invoices().len(),
        "groups": session.groups().map(|g| g.len()),
        "join_policy": session.config().join_policy,
    })
}
