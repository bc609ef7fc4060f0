use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::shared::state::AppState;
use crate::core::urls::ApiUrls;

use super::{ChatMessage, LLMProvider, LlmError};

pub const SYSTEM_PROMPT: &str = "Du bist ein hilfreicher KI-Assistent für einen IT-Helpdesk. Antworte professionell und freundlich auf Deutsch.";
pub const INVALID_MESSAGES: &str = "Ungültige Nachrichtenstruktur";
pub const INTERNAL_ERROR: &str = "Interner Serverfehler";

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Ungültige Nachrichtenstruktur")]
    InvalidMessages,
    #[error("{0}")]
    Upstream(String),
}

impl From<LlmError> for RelayError {
    fn from(err: LlmError) -> Self {
        let message = err.to_string();
        if message.trim().is_empty() {
            Self::Upstream(INTERNAL_ERROR.to_string())
        } else {
            Self::Upstream(message)
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::InvalidMessages => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Stateless forwarder: every call carries the whole conversation.
#[derive(Clone)]
pub struct ChatRelay {
    provider: Arc<dyn LLMProvider>,
}

impl ChatRelay {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }

    pub async fn relay(&self, messages: Vec<ChatMessage>) -> Result<String, RelayError> {
        if messages.is_empty() {
            return Err(RelayError::InvalidMessages);
        }

        let mut conversation = Vec::with_capacity(messages.len() + 1);
        conversation.push(ChatMessage::system(SYSTEM_PROMPT));
        conversation.extend(messages);

        match self.provider.chat(&conversation).await {
            Ok(content) => {
                info!("Chat relay answered {} message(s)", conversation.len() - 1);
                Ok(content)
            }
            Err(e) => {
                error!("Chat relay upstream failure: {e}");
                Err(e.into())
            }
        }
    }

    pub fn parse_request(body: &[u8]) -> Result<Vec<ChatMessage>, RelayError> {
        serde_json::from_slice::<ChatRequest>(body)
            .map(|req| req.messages)
            .map_err(|_| RelayError::InvalidMessages)
    }
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ChatResponse>, RelayError> {
    let messages = ChatRelay::parse_request(&body)?;
    let content = state.relay.relay(messages).await?;
    Ok(Json(ChatResponse { content }))
}

pub fn configure_chat_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(ApiUrls::CHAT_OPENAI, post(chat))
        .route(ApiUrls::CHAT, post(chat))
}
