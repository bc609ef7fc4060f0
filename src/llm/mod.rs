use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod relay;

pub use relay::{configure_chat_routes, ChatRelay, RelayError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
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

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    /// Non-success status; `message` is the provider's own error text when it sent one.
    #[error("{message}")]
    Upstream { status: u16, message: String },
    #[error("Malformed model response: {0}")]
    Malformed(String),
    #[error("Model returned no choices")]
    NoChoices,
}

#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Sends the full conversation and returns the first choice's text.
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;
}

pub struct OpenAIClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAIClient {
    pub fn new(api_key: String, base_url: Option<String>, model: impl Into<String>) -> Self {
        let base_url = base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string());
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

}

fn upstream_error(status: u16, body: &str) -> LlmError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v["error"]["message"]
                .as_str()
                .or_else(|| v["error"].as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string());
    LlmError::Upstream { status, message }
}

#[async_trait]
impl LLMProvider for OpenAIClient {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&serde_json::json!({
                "model": self.model,
                "messages": messages,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(upstream_error(status.as_u16(), &body));
        }

        let result: Value = response
            .json()
            .await
            .map_err(|e| LlmError::Malformed(e.to_string()))?;
        let choice = result["choices"].get(0).ok_or(LlmError::NoChoices)?;
        Ok(choice["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[tokio::test]
    async fn test_chat_returns_first_choice() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-3.5-turbo",
                "messages": [{"role": "user", "content": "Hallo"}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "choices": [
                        {"message": {"role": "assistant", "content": "Guten Tag!"}},
                        {"message": {"role": "assistant", "content": "Zweite Antwort"}}
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = OpenAIClient::new("sk-test".into(), Some(server.url()), "gpt-3.5-turbo");
        let reply = client.chat(&[ChatMessage::user("Hallo")]).await.unwrap();

        mock.assert_async().await;
        assert_eq!(reply, "Guten Tag!");
    }

    #[tokio::test]
    async fn test_upstream_error_message_is_kept() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body(r#"{"error":{"message":"Rate limit reached","type":"requests"}}"#)
            .create_async()
            .await;

        let client = OpenAIClient::new("sk-test".into(), Some(server.url()), "gpt-3.5-turbo");
        let err = client.chat(&[ChatMessage::user("Hallo")]).await.unwrap_err();

        assert!(matches!(err, LlmError::Upstream { status: 429, .. }));
        assert_eq!(err.to_string(), "Rate limit reached");
    }

    #[tokio::test]
    async fn test_empty_choices_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let client = OpenAIClient::new("sk-test".into(), Some(server.url()), "gpt-3.5-turbo");
        let err = client.chat(&[ChatMessage::user("Hallo")]).await.unwrap_err();
        assert!(matches!(err, LlmError::NoChoices));
    }

    #[test]
    fn test_chat_role_wire_names() {
        let message: ChatMessage =
            serde_json::from_value(json!({"role": "assistant", "content": "ok"})).unwrap();
        assert_eq!(message.role, ChatRole::Assistant);
        assert!(serde_json::from_value::<ChatMessage>(json!({"role": "bot", "content": "x"})).is_err());
    }
}
