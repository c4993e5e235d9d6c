//! Handing drafts to an external transport.
//!
//! The transport itself (mail client, transactional email API) lives behind
//! [`DraftDispatcher`]. This module only sequences a batch, marks successes
//! on the [`DispatchTracker`] and reports failures back to the caller. No
//! retries happen here.

use mailmerge_core::JoinKey;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;
use thiserror::Error;

use crate::draft::Draft;
use crate::tracker::DispatchTracker;

/// Characters `encodeURIComponent` leaves alone.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Address lists additionally keep `@` and `,` readable.
const ADDRESS_LIST: &AsciiSet = &URI_COMPONENT.remove(b'@').remove(b',');

/// `mailto:` URI for a draft: addresses in the path, subject and body as
/// percent-encoded query parameters.
pub fn mailto_link(draft: &Draft) -> String {
    format!(
        "mailto:{}?subject={}&body={}",
        utf8_percent_encode(&draft.to, ADDRESS_LIST),
        utf8_percent_encode(&draft.subject, URI_COMPONENT),
        utf8_percent_encode(&draft.body, URI_COMPONENT),
    )
}

#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum TransportError {
    #[error("draft has no recipient address")]
    MissingAddress,

    #[error("transport rejected the message: {0}")]
    Rejected(String),

    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

/// Performs the actual send for one draft.
///
/// Returns an opaque receipt (message id, link, ...) on success.
#[async_trait::async_trait]
pub trait DraftDispatcher: Send + Sync {
    async fn dispatch(&self, draft: &Draft) -> Result<String, TransportError>;
}

/// Built-in dispatcher: the "send" is handing the user a `mailto:` link.
///
/// Drafts without an address are still accepted so the user can fill the
/// recipient in their mail client.
#[derive(Debug, Clone, Copy, Default)]
pub struct MailtoDispatcher;

#[async_trait::async_trait]
impl DraftDispatcher for MailtoDispatcher {
    async fn dispatch(&self, draft: &Draft) -> Result<String, TransportError> {
        Ok(mailto_link(draft))
    }
}

/// Outcome of a batch. Every draft attempted ends up in exactly one list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub succeeded: Vec<JoinKey>,
    pub failed: Vec<(JoinKey, TransportError)>,
    /// Drafts skipped because the tracker already had them as dispatched.
    pub skipped: usize,
}

impl BatchReport {
    pub fn succeeded_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Dispatch every not-yet-dispatched draft, one at a time, in order.
pub async fn dispatch_batch<D>(dispatcher: &D, drafts: &[Draft], tracker: &mut DispatchTracker) -> BatchReport
where
    D: DraftDispatcher + ?Sized,
{
    let mut report = BatchReport::default();

    for draft in drafts {
        if tracker.is_dispatched(&draft.group_key) {
            report.skipped += 1;
            continue;
        }
        match dispatcher.dispatch(draft).await {
            Ok(_) => {
                tracker.mark_dispatched(&draft.group_key);
                report.succeeded.push(draft.group_key.clone());
            }
            Err(err) => {
                tracing::warn!(key = %draft.group_key, error = %err, "draft dispatch failed");
                report.failed.push((draft.group_key.clone(), err));
            }
        }
    }

    tracing::info!(
        succeeded = report.succeeded_count(),
        failed = report.failed_count(),
        skipped = report.skipped,
        remaining = tracker.remaining(),
        "draft batch dispatched"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(key: &str, to: &str) -> Draft {
        Draft {
            group_key: JoinKey::new(key),
            recipient_name: key.to_string(),
            to: to.to_string(),
            subject: "Anulación de comprobantes".to_string(),
            body: "Línea 1\nA & B = 100% (ok)".to_string(),
            has_email: !to.is_empty(),
            unresolved: Vec::new(),
        }
    }

    /// Fails drafts without an address, like a transactional API would.
    struct StrictDispatcher;

    #[async_trait::async_trait]
    impl DraftDispatcher for StrictDispatcher {
        async fn dispatch(&self, draft: &Draft) -> Result<String, TransportError> {
            if draft.to.is_empty() {
                return Err(TransportError::MissingAddress);
            }
            Ok(format!("msg-{}", draft.group_key))
        }
    }

    #[test]
    fn mailto_encodes_like_encode_uri_component() {
        let link = mailto_link(&draft("001", "a@x.com,b@y.com"));
        assert_eq!(
            link,
            "mailto:a@x.com,b@y.com?subject=Anulaci%C3%B3n%20de%20comprobantes\
             &body=L%C3%ADnea%201%0AA%20%26%20B%20%3D%20100%25%20(ok)"
        );
    }

    #[test]
    fn mailto_without_address_keeps_empty_path() {
        assert!(mailto_link(&draft("001", "")).starts_with("mailto:?subject="));
    }

    #[tokio::test]
    async fn batch_reports_partial_failures_and_marks_successes() {
        let drafts = vec![draft("001", "a@x.com"), draft("002", ""), draft("003", "c@x.com")];
        let mut tracker = DispatchTracker::for_drafts(&drafts);

        let report = dispatch_batch(&StrictDispatcher, &drafts, &mut tracker).await;

        assert_eq!(report.succeeded_count(), 2);
        assert_eq!(report.failed, vec![(JoinKey::new("002"), TransportError::MissingAddress)]);
        assert!(!report.is_complete());
        assert_eq!(tracker.remaining(), 1);
        assert!(!tracker.is_dispatched(&JoinKey::new("002")));
    }

    #[tokio::test]
    async fn second_batch_skips_already_dispatched() {
        let drafts = vec![draft("001", "a@x.com"), draft("002", "")];
        let mut tracker = DispatchTracker::for_drafts(&drafts);

        let first = dispatch_batch(&MailtoDispatcher, &drafts[..1], &mut tracker).await;
        assert_eq!(first.succeeded_count(), 1);

        let second = dispatch_batch(&MailtoDispatcher, &drafts, &mut tracker).await;
        assert_eq!(second.skipped, 1);
        assert_eq!(second.succeeded, vec![JoinKey::new("002")]);
        assert_eq!(tracker.remaining(), 0);
    }
}
