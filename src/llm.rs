use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::ChatModel;
use crate::error::DiscoError;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: ChatModel,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    pub fn new(
        model: ChatModel,
        temperature: f32,
        system: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Self {
            model,
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature,
            max_tokens: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn user_content(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|message| message.role == ChatRole::User)
            .map(|message| message.content.as_str())
    }
}

pub trait ChatClient: Send + Sync {
    fn complete(&self, request: &ChatRequest) -> Result<String, DiscoError>;
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Clone)]
pub struct OpenAiHttpClient {
    client: Client,
    base_url: String,
}

impl OpenAiHttpClient {
    pub fn new() -> Result<Self, DiscoError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or(DiscoError::MissingApiKey)?;
        let base_url = std::env::var("OPENAI_BASE_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::with_base_url(base_url, &api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: &str) -> Result<Self, DiscoError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("discopath/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| DiscoError::LlmHttp(err.to_string()))?,
        );
        let mut bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| DiscoError::MissingApiKey)?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|err| DiscoError::LlmHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn send_with_retries<F>(
        &self,
        mut make_req: F,
    ) -> Result<reqwest::blocking::Response, DiscoError>
    where
        F: FnMut() -> reqwest::blocking::RequestBuilder,
    {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 200;
        let mut attempt = 0usize;
        loop {
            match make_req().send() {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < MAX_RETRIES && is_retryable_status(status) {
                        debug!(status, attempt, "completion.retry");
                        thread::sleep(Duration::from_millis(BASE_DELAY_MS * (attempt as u64 + 1)));
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < MAX_RETRIES && (err.is_timeout() || err.is_connect()) {
                        debug!(error = %err, attempt, "completion.retry");
                        thread::sleep(Duration::from_millis(BASE_DELAY_MS * (attempt as u64 + 1)));
                        attempt += 1;
                        continue;
                    }
                    return Err(DiscoError::LlmHttp(err.to_string()));
                }
            }
        }
    }
}

impl ChatClient for OpenAiHttpClient {
    fn complete(&self, request: &ChatRequest) -> Result<String, DiscoError> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self.send_with_retries(|| self.client.post(&url).json(request))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "completion request failed".to_string());
            return Err(DiscoError::LlmStatus { status, message });
        }
        let body: CompletionResponse = response
            .json()
            .map_err(|err| DiscoError::LlmHttp(err.to_string()))?;
        first_choice_content(body)
    }
}

fn first_choice_content(body: CompletionResponse) -> Result<String, DiscoError> {
    body.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or(DiscoError::LlmEmptyResponse)
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_wire_model_and_omits_max_tokens() {
        let request = ChatRequest::new(ChatModel::Gpt35Turbo, 0.0, "sys", "usr");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-3.5-turbo");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "usr");
        assert!(json.get("max_tokens").is_none());

        let json = serde_json::to_value(request.with_max_tokens(500)).unwrap();
        assert_eq!(json["max_tokens"], 500);
    }

    #[test]
    fn null_or_blank_content_is_empty_response() {
        let body: CompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert!(matches!(
            first_choice_content(body),
            Err(DiscoError::LlmEmptyResponse)
        ));
        let body: CompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(first_choice_content(body).is_err());
        let body: CompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":" Yes. "}}]}"#).unwrap();
        assert_eq!(first_choice_content(body).unwrap(), "Yes.");
    }
}
