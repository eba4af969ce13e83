use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GeminiConfig;
use crate::models::chat::ChatMessage;
use crate::services::conversation::ChatBackend;
use crate::utils::error::BackendError;

// Fixed generation parameters, matched to the support-bot tuning.
const TEMPERATURE: f32 = 0.7;
const MAX_OUTPUT_TOKENS: usize = 300;
const TOP_P: f32 = 0.8;

/// Gemini client via the OpenAI-compatible chat-completions endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: usize,
    top_p: f32,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(config.timeout_seconds))
                .build()
                .unwrap_or_else(|_| Client::new()),
            config,
        }
    }
}

#[async_trait]
impl ChatBackend for GeminiClient {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String, BackendError> {
        debug!("Calling Gemini with {} prompt messages", messages.len());

        let url = format!("{}/chat/completions", self.config.base_url);
        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages,
            temperature: TEMPERATURE,
            max_tokens: MAX_OUTPUT_TOKENS,
            top_p: TOP_P,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| BackendError::Failed(format!("Gemini network error: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Failed(format!(
                "Gemini API error ({}): {}",
                status, body
            )));
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Failed(format!("Failed to parse Gemini response: {}", e)))?;

        let choice = body.choices.into_iter().next().ok_or(BackendError::Empty)?;
        if choice.finish_reason.as_deref() == Some("content_filter") {
            return Err(BackendError::Failed(
                "Response blocked by content safety filter".to_string(),
            ));
        }

        match choice.message.content {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(BackendError::Empty),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_fixed_generation_parameters() {
        let messages = vec![ChatMessage::system("sys"), ChatMessage::user("hi")];
        let request = ChatCompletionRequest {
            model: "gemini-1.5-flash",
            messages: &messages,
            temperature: TEMPERATURE,
            max_tokens: MAX_OUTPUT_TOKENS,
            top_p: TOP_P,
            stream: false,
        };

        let value = serde_json::to_value(&request).expect("serializes");
        assert_eq!(value["model"], "gemini-1.5-flash");
        assert_eq!(value["max_tokens"], 300);
        assert_eq!(value["stream"], false);
        assert_eq!(value["messages"][1]["role"], "user");
    }

    #[test]
    fn response_parsing_tolerates_missing_content() {
        let raw = r#"{"choices":[{"message":{},"finish_reason":"stop"}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(raw).expect("parses");
        assert!(parsed.choices[0].message.content.is_none());
    }
}
