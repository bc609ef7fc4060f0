use axum::{extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse, Json};

use super::types::TicketStatus;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TicketError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Store error: {0}")]
    Store(String),
    #[error("Cannot {action} ticket #{id} while it is {from}")]
    InvalidTransition {
        id: i64,
        from: TicketStatus,
        action: &'static str,
    },
    #[error("Ticket #{0} not found")]
    NotFound(i64),
}

impl From<diesel::result::Error> for TicketError {
    fn from(e: diesel::result::Error) -> Self {
        Self::Store(e.to_string())
    }
}

impl From<diesel::r2d2::PoolError> for TicketError {
    fn from(e: diesel::r2d2::PoolError) -> Self {
        Self::Store(format!("DB error: {e}"))
    }
}

impl From<tokio::task::JoinError> for TicketError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Store(format!("Task error: {e}"))
    }
}

impl From<JsonRejection> for TicketError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<reqwest::Error> for TicketError {
    fn from(e: reqwest::Error) -> Self {
        Self::Store(e.to_string())
    }
}

impl IntoResponse for TicketError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidTransition { .. } => StatusCode::CONFLICT,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
