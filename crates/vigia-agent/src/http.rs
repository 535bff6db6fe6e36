//! HTTP processing agent.
//!
//! Posts the confirmed instruction and file batch to an external worker and
//! waits for its result descriptor. The worker is a black box: how it reads
//! the files or produces the artifact is its own business.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use vigia_core::{
    config::AgentConfig,
    error::VigiaError,
    traits::ProcessingAgent,
    types::{AgentOutput, FileRef},
};

/// Agent reached over HTTP.
pub struct HttpAgent {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    timeout: std::time::Duration,
}

impl HttpAgent {
    /// Create from config values.
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            timeout: std::time::Duration::from_secs(config.timeout_secs),
        }
    }
}

#[derive(Serialize)]
struct RunRequest<'a> {
    instruction: &'a str,
    files: &'a [FileRef],
}

#[derive(Deserialize)]
struct RunResponse {
    #[serde(default)]
    status: String,
    artifact_url: Option<String>,
    error: Option<String>,
}

#[async_trait]
impl ProcessingAgent for HttpAgent {
    fn name(&self) -> &str {
        "http"
    }

    async fn run(&self, files: &[FileRef], instruction: &str) -> Result<AgentOutput, VigiaError> {
        let body = RunRequest { instruction, files };

        debug!(
            "agent: POST {} files={} instruction={:?}",
            self.endpoint,
            files.len(),
            instruction
        );

        let resp = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| VigiaError::Agent(format!("agent request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(VigiaError::Agent(format!("agent returned {status}: {text}")));
        }

        let parsed: RunResponse = resp
            .json()
            .await
            .map_err(|e| VigiaError::Agent(format!("agent: failed to parse response: {e}")))?;

        if parsed.status != "ok" {
            let reason = parsed
                .error
                .unwrap_or_else(|| format!("agent reported status '{}'", parsed.status));
            return Err(VigiaError::Agent(reason));
        }

        Ok(AgentOutput {
            artifact_location: parsed.artifact_url,
        })
    }

    async fn is_available(&self) -> bool {
        if self.endpoint.is_empty() {
            warn!("agent: no endpoint configured");
            return false;
        }
        true
    }
}
