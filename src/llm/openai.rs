//! OpenAI-compatible chat completion client.
//!
//! Works against api.openai.com or any compatible endpoint via the
//! configurable base URL. Maps every transport-level failure — connect
//! errors, timeouts, auth, quota — onto the fatal [`ServiceError`] class.

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::llm::TextService;

/// Response token budget — stage answers are small JSON objects.
const MAX_TOKENS: u32 = 1024;

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Generative text service over an OpenAI-compatible chat API.
pub struct OpenAiChatService {
    client: reqwest::Client,
    config: ServiceConfig,
}

impl OpenAiChatService {
    pub fn new(config: ServiceConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();
        Self { client, config }
    }

    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let bearer = format!("Bearer {}", self.config.api_key.expose_secret());
        if let Ok(value) = HeaderValue::from_str(&bearer) {
            headers.insert(AUTHORIZATION, value);
        }
        headers
    }

    fn build_body(&self, prompt: &str, system_instruction: &str, temperature: f32) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);
        if !system_instruction.is_empty() {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system_instruction.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        });

        ChatRequest {
            model: self.config.model.clone(),
            messages,
            temperature,
            max_tokens: MAX_TOKENS,
        }
    }

    fn classify_status(status: StatusCode, retry_after: Option<u64>) -> ServiceError {
        match status.as_u16() {
            401 | 403 => ServiceError::AuthFailed,
            429 => ServiceError::RateLimited {
                retry_after: retry_after.map(std::time::Duration::from_secs),
            },
            code => ServiceError::Unavailable {
                reason: format!("HTTP {code}"),
            },
        }
    }
}

#[async_trait]
impl TextService for OpenAiChatService {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn generate(
        &self,
        prompt: &str,
        system_instruction: &str,
        temperature: f32,
    ) -> Result<String, ServiceError> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let body = self.build_body(prompt, system_instruction, temperature);

        let response = self
            .client
            .post(&url)
            .headers(self.build_headers())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ServiceError::Timeout {
                        timeout: self.config.timeout,
                    }
                } else {
                    ServiceError::Unavailable {
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(Self::classify_status(status, retry_after));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            ServiceError::Unavailable {
                reason: format!("malformed API envelope: {e}"),
            }
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ServiceError::Unavailable {
                reason: "no completion choices in response".to_string(),
            })?;

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn service() -> OpenAiChatService {
        OpenAiChatService::new(ServiceConfig::new(
            SecretString::from("test-key"),
            "gpt-4o-mini",
        ))
    }

    #[test]
    fn body_includes_system_and_user_messages() {
        let body = service().build_body("classify this", "you are a classifier", 0.3);
        assert_eq!(body.messages.len(), 2);
        assert_eq!(body.messages[0].role, "system");
        assert_eq!(body.messages[1].role, "user");
        assert_eq!(body.messages[1].content, "classify this");
        assert_eq!(body.model, "gpt-4o-mini");
        assert!((body.temperature - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn body_omits_empty_system_instruction() {
        let body = service().build_body("hello", "", 0.7);
        assert_eq!(body.messages.len(), 1);
        assert_eq!(body.messages[0].role, "user");
    }

    #[test]
    fn body_serializes_to_chat_payload() {
        let body = service().build_body("p", "s", 0.5);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert!(json["messages"].is_array());
        assert_eq!(json["max_tokens"], 1024);
    }

    #[test]
    fn status_classification() {
        assert!(matches!(
            OpenAiChatService::classify_status(StatusCode::UNAUTHORIZED, None),
            ServiceError::AuthFailed
        ));
        assert!(matches!(
            OpenAiChatService::classify_status(StatusCode::FORBIDDEN, None),
            ServiceError::AuthFailed
        ));
        match OpenAiChatService::classify_status(StatusCode::TOO_MANY_REQUESTS, Some(7)) {
            ServiceError::RateLimited { retry_after } => {
                assert_eq!(retry_after, Some(std::time::Duration::from_secs(7)));
            }
            other => panic!("Expected RateLimited, got {other:?}"),
        }
        assert!(matches!(
            OpenAiChatService::classify_status(StatusCode::INTERNAL_SERVER_ERROR, None),
            ServiceError::Unavailable { .. }
        ));
    }

    #[test]
    fn response_envelope_parsing() {
        let json = r#"{"choices": [{"message": {"content": "{\"category\": \"Work\"}"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("{\"category\": \"Work\"}")
        );
    }
}
