//! HTTP client for an Azure OpenAI style chat-completions deployment.

use std::time::Duration;

use tracing::{debug, warn};

use parley_core::config::CompletionConfig;

use crate::error::CompletionError;
use crate::types::{Completion, CompletionRequest, CompletionResponse};

/// Anything that can turn a question into a completion.
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    /// Ask a single question. The caller has already checked that it is
    /// non-empty.
    async fn complete(&self, question: &str) -> Result<Completion, CompletionError>;
}

/// Client for a deployment addressed by a full endpoint URL and an
/// `api-key` header.
pub struct AzureCompletionClient {
    http: reqwest::Client,
    config: CompletionConfig,
}

impl AzureCompletionClient {
    /// Build a client from its configuration. The timeout covers the whole
    /// request, body included.
    pub fn new(config: CompletionConfig) -> Result<Self, CompletionError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CompletionError::Client(e.to_string()))?;

        Ok(Self { http, config })
    }

    fn map_send_error(&self, err: reqwest::Error) -> CompletionError {
        if err.is_timeout() {
            CompletionError::Timeout(self.config.timeout_secs)
        } else {
            CompletionError::Transport(err.to_string())
        }
    }
}

#[async_trait::async_trait]
impl CompletionClient for AzureCompletionClient {
    async fn complete(&self, question: &str) -> Result<Completion, CompletionError> {
        if self.config.endpoint.is_empty() {
            return Err(CompletionError::NotConfigured);
        }

        let body = CompletionRequest::single_turn(question, &self.config);

        let resp = self
            .http
            .post(&self.config.endpoint)
            .header("api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Completion endpoint returned an error");
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let bytes = resp.bytes().await.map_err(|e| self.map_send_error(e))?;
        let parsed = match serde_json::from_slice::<CompletionResponse>(&bytes) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "Completion response body is not valid JSON");
                CompletionResponse::default()
            }
        };

        let completion = parsed.into_completion();
        match &completion {
            Completion::Answer(text) => debug!(answer_len = text.len(), "Completion received"),
            Completion::Empty => debug!("Completion response carried no choices"),
        }
        Ok(completion)
    }
}
