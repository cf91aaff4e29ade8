// src/core/narrative.rs

//! Client for the narrative-analysis step: one chat-completion call that
//! turns the aggregated probe text into a natural-language report.

use std::time::Duration;

use serde_json::{Value, json};
use tracing::info;

use crate::config::NarrativeConfig;
use crate::core::models::ProbeError;

/// Placeholder analysis used whenever the narrative step does not run.
pub const ANALYSIS_NOT_EXECUTED: &str = "Narrative analysis was not executed.";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Calls a DeepSeek-compatible chat-completions endpoint with the assembled
/// prompt as a single user message.
pub struct NarrativeClient {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl NarrativeClient {
    pub fn new(config: &NarrativeConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("atalaya/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
        })
    }

    /// Sends the prompt and returns the model's answer. Transport, auth and
    /// response-shape problems all surface as probe errors; the caller
    /// decides how to fold them into the report.
    pub async fn analyze(&self, prompt: &str) -> Result<String, ProbeError> {
        info!(prompt_chars = prompt.len(), "Requesting narrative analysis.");
        let body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "stream": false,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProbeError::Transport(format!("narrative request failed: {e}")))?
            .error_for_status()
            .map_err(|e| ProbeError::Transport(format!("narrative API rejected the request: {e}")))?;

        let payload: Value = response
            .json()
            .await
            .map_err(|e| ProbeError::Malformed(format!("narrative response was not JSON: {e}")))?;

        extract_analysis(&payload).ok_or_else(|| {
            ProbeError::Malformed("narrative response carried no message content".to_string())
        })
    }
}

/// Pulls the first choice's message content out of a chat-completion
/// response body.
pub fn extract_analysis(payload: &Value) -> Option<String> {
    payload
        .get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .map(str::to_string)
}
