//! Chat-completion access for the pipeline's language tasks.
//!
//! [`LanguageModel`] is the seam the classifier, translator and summarizer
//! depend on. [`OpenAiClient`] talks to an OpenAI-compatible endpoint and
//! [`RetryingModel`] wraps any model with the bounded backoff policy.

pub mod client;
pub mod retry;

use async_trait::async_trait;
use awsdigest_shared::Result;
use serde::{Deserialize, Serialize};

pub use client::OpenAiClient;
pub use retry::{RetryPolicy, RetryingModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A chat model returning the text of its first choice.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}
