//! OpenAI-compatible chat completions client.

use std::time::Duration;

use async_trait::async_trait;
use awsdigest_shared::{DigestError, OpenAiConfig, Result, SecretSource};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::{ChatMessage, LanguageModel};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

pub struct OpenAiClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(config: &OpenAiConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DigestError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            api_key: api_key.into(),
        })
    }

    /// Build a client whose API key is resolved through `secrets`.
    pub fn from_secrets(config: &OpenAiConfig, secrets: &dyn SecretSource) -> Result<Self> {
        let api_key = secrets.get(&config.api_key_secret)?;
        Self::new(config, api_key)
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    #[instrument(skip_all, fields(model = %self.model, messages = messages.len()))]
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages,
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    DigestError::model_transient(format!("request failed: {e}"))
                } else {
                    DigestError::model(format!("request failed: {e}"))
                }
            })?;

        let json = check_response_status(resp).await?;
        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .map(str::trim)
            .unwrap_or("");

        if content.is_empty() {
            return Err(DigestError::model("empty reply"));
        }

        debug!(reply_len = content.len(), "completion received");
        Ok(content.to_string())
    }
}

/// Map an HTTP response onto the transient/permanent model error split.
async fn check_response_status(resp: reqwest::Response) -> Result<serde_json::Value> {
    let status = resp.status();
    let text = resp
        .text()
        .await
        .map_err(|e| DigestError::model_transient(format!("body read failed: {e}")))?;

    if !status.is_success() {
        let body: serde_json::Value = serde_json::from_str(&text).unwrap_or_default();
        let message = body["error"]["message"]
            .as_str()
            .or_else(|| body["message"].as_str())
            .unwrap_or(text.as_str());
        let msg = format!("API error [{}]: {message}", status.as_u16());

        return Err(
            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                DigestError::model_transient(msg)
            } else {
                DigestError::model(msg)
            },
        );
    }

    serde_json::from_str(&text).map_err(|e| DigestError::model(format!("malformed reply: {e}")))
}
