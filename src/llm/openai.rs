//! OpenAI-compatible chat completions provider.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::llm::{ChatTurn, CompletionService};

/// Chat completions client with API key auth.
pub struct OpenAiProvider {
    client: Client,
    base_url: String,
    model: String,
    api_key: SecretString,
}

#[derive(Serialize)]
struct CompletionsRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
}

#[derive(Deserialize)]
struct CompletionsResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiProvider {
    /// Create a provider against an OpenAI-compatible base URL.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, api_key: SecretString) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
            api_key,
        }
    }

    fn api_url(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl CompletionService for OpenAiProvider {
    async fn complete(&self, history: &[ChatTurn]) -> Result<String, LlmError> {
        let url = self.api_url();
        let body = CompletionsRequest {
            model: &self.model,
            messages: history,
        };

        tracing::debug!(turns = history.len(), "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            if status.as_u16() == 401 {
                return Err(LlmError::AuthFailed {
                    provider: "openai".to_string(),
                });
            }
            if status.as_u16() == 429 {
                return Err(LlmError::RateLimited {
                    provider: "openai".to_string(),
                });
            }
            return Err(LlmError::RequestFailed {
                reason: format!("HTTP {status}: {text}"),
            });
        }

        let parsed: CompletionsResponse =
            serde_json::from_str(&text).map_err(|e| LlmError::InvalidResponse {
                reason: format!("JSON parse error: {e}"),
            })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::InvalidResponse {
                reason: "Response contained no choices".to_string(),
            })
    }
}
