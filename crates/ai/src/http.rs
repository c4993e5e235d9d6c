use serde::{Deserialize, Serialize};

use crate::result::RewriteError;
use crate::rewrite::{RewriteRequest, TemplateRewriter};

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    template: &'a str,
    guidance: &'a str,
    instructions: String,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    completed_template: String,
}

/// Rewriter backed by an HTTP endpoint.
///
/// POSTs `{template, guidance, instructions}` as JSON and expects
/// `{completed_template}` back.
#[derive(Debug, Clone)]
pub struct HttpTemplateRewriter {
    client: reqwest::Client,
    url: String,
}

impl HttpTemplateRewriter {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl TemplateRewriter for HttpTemplateRewriter {
    async fn rewrite(&self, request: &RewriteRequest) -> Result<String, RewriteError> {
        let body = WireRequest {
            template: &request.template,
            guidance: &request.guidance,
            instructions: request.instructions(),
        };

        let res = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RewriteError::Unavailable(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            return Err(RewriteError::Unavailable(format!("status {status}")));
        }

        let parsed: WireResponse = res
            .json()
            .await
            .map_err(|e| RewriteError::InvalidResponse(e.to_string()))?;
        tracing::debug!(url = %self.url, chars = parsed.completed_template.len(), "template rewritten");
        Ok(parsed.completed_template)
    }
}
