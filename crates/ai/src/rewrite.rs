use mailmerge_template::placeholders;
use serde::{Deserialize, Serialize};

use crate::result::{RewriteError, RewriteOutcome};

/// Input for one rewrite: the current template and the user's key ideas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteRequest {
    pub template: String,
    #[serde(default)]
    pub guidance: String,
}

impl RewriteRequest {
    pub fn new(template: impl Into<String>, guidance: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            guidance: guidance.into(),
        }
    }

    /// Instructions sent alongside the request to a language model.
    pub fn instructions(&self) -> String {
        let names = placeholders(&self.template)
            .iter()
            .map(|n| format!("{{{{{n}}}}}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "Rewrite the email template to be more professional and clear, incorporating the key ideas. \
             Keep every placeholder exactly as written ({names}); do not fill them with example data. \
             Return a generic template, not a filled-in email.\n\n\
             Original template:\n{}\n\nKey ideas:\n{}",
            self.template, self.guidance
        )
    }
}

/// External collaborator that rewrites template text.
///
/// Implementations must keep every `{{...}}` placeholder verbatim; callers
/// should go through [`rewrite_checked`], which verifies it.
#[async_trait::async_trait]
pub trait TemplateRewriter: Send + Sync {
    async fn rewrite(&self, request: &RewriteRequest) -> Result<String, RewriteError>;
}

/// Every placeholder of `original` must still occur in `revised`.
pub fn ensure_placeholders_preserved(original: &str, revised: &str) -> Result<Vec<String>, RewriteError> {
    let kept = placeholders(revised);
    let (present, dropped): (Vec<String>, Vec<String>) =
        placeholders(original).into_iter().partition(|name| kept.contains(name));

    if dropped.is_empty() {
        Ok(present)
    } else {
        Err(RewriteError::PlaceholdersDropped(dropped))
    }
}

/// Run `rewriter` and reject revisions that lost placeholders.
pub async fn rewrite_checked<R>(rewriter: &R, request: &RewriteRequest) -> Result<RewriteOutcome, RewriteError>
where
    R: TemplateRewriter + ?Sized,
{
    if request.template.trim().is_empty() {
        return Err(RewriteError::EmptyTemplate);
    }

    let revised = rewriter.rewrite(request).await?;
    match ensure_placeholders_preserved(&request.template, &revised) {
        Ok(placeholders) => Ok(RewriteOutcome {
            template: revised,
            placeholders,
        }),
        Err(err) => {
            tracing::warn!(error = %err, "template rewrite rejected");
            Err(err)
        }
    }
}
