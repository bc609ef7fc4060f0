//! Backend for a hosted table API in the PostgREST dialect (`/rest/v1/<table>`,
//! `column=eq.value` filters, `Prefer: return=representation` echoes).
//!
//! The API has no multi-statement transactions. `apply` narrows the status update
//! with a filter on the permitted source statuses, so a concurrent transition by
//! other staff makes the update match nothing. The audit comment is a second,
//! separate write: if it fails the status change stands and the failure is logged.

use async_trait::async_trait;
use log::{error, warn};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::{TicketStore, COMMENTS_TABLE, TICKETS_TABLE};
use crate::tickets::error::TicketError;
use crate::tickets::types::{NewComment, NewTicket, SupportTicket, TicketAction, TicketComment};

const RETURN_REPRESENTATION: &str = "return=representation";

#[derive(Clone)]
pub struct RestTicketStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestTicketStore {
    pub fn new(url: &str, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: format!("{}/rest/v1", url.trim_end_matches('/')),
            api_key: api_key.into(),
        }
    }

    fn table(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.base_url, table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn ticket_rows(&self, request: RequestBuilder) -> Result<Vec<SupportTicket>, TicketError> {
        rows(request.send().await?).await
    }
}

fn upstream_message(status: reqwest::StatusCode, body: &str) -> String {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());
    if message.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {message}")
    }
}

async fn check(response: Response) -> Result<Response, TicketError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = upstream_message(status, &body);
    error!("Table API request failed: {message}");
    Err(TicketError::Store(message))
}

async fn rows<T: DeserializeOwned>(response: Response) -> Result<Vec<T>, TicketError> {
    Ok(check(response).await?.json::<Vec<T>>().await?)
}

fn eq(value: i64) -> String {
    format!("eq.{value}")
}

#[async_trait]
impl TicketStore for RestTicketStore {
    async fn list_tickets(&self) -> Result<Vec<SupportTicket>, TicketError> {
        self.ticket_rows(
            self.table(Method::GET, TICKETS_TABLE)
                .query(&[("select", "*"), ("order", "created_at.desc,id.desc")]),
        )
        .await
    }

    async fn get_ticket(&self, id: i64) -> Result<SupportTicket, TicketError> {
        self.ticket_rows(
            self.table(Method::GET, TICKETS_TABLE)
                .query(&[("select", "*".to_string()), ("id", eq(id))]),
        )
        .await?
        .into_iter()
        .next()
        .ok_or(TicketError::NotFound(id))
    }

    async fn insert_ticket(&self, ticket: NewTicket) -> Result<SupportTicket, TicketError> {
        self.ticket_rows(
            self.table(Method::POST, TICKETS_TABLE)
                .header("Prefer", RETURN_REPRESENTATION)
                .json(&ticket),
        )
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| TicketError::Store("insert returned no row".to_string()))
    }

    async fn set_read(&self, id: i64, is_read: bool) -> Result<SupportTicket, TicketError> {
        self.ticket_rows(
            self.table(Method::PATCH, TICKETS_TABLE)
                .header("Prefer", RETURN_REPRESENTATION)
                .query(&[("id", eq(id))])
                .json(&json!({ "is_read": is_read })),
        )
        .await?
        .into_iter()
        .next()
        .ok_or(TicketError::NotFound(id))
    }

    async fn apply(&self, id: i64, action: &TicketAction) -> Result<SupportTicket, TicketError> {
        let allowed = action
            .allowed_from()
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(",");

        let mut changes = json!({ "status": action.target() });
        if let Some(staff) = action.assigns() {
            changes["assigned_to"] = json!(staff);
        }

        let updated = self
            .ticket_rows(
                self.table(Method::PATCH, TICKETS_TABLE)
                    .header("Prefer", RETURN_REPRESENTATION)
                    .query(&[("id", eq(id)), ("status", format!("in.({allowed})"))])
                    .json(&changes),
            )
            .await?
            .into_iter()
            .next();

        let Some(updated) = updated else {
            let current = self.get_ticket(id).await?;
            return Err(TicketError::InvalidTransition {
                id,
                from: current.status,
                action: action.name(),
            });
        };

        if let Err(e) = self.insert_comment(action.audit_comment(id)).await {
            warn!(
                "Ticket #{id} is now {} but its audit comment was not written: {e}",
                updated.status
            );
        }

        Ok(updated)
    }

    async fn delete_ticket(&self, id: i64) -> Result<(), TicketError> {
        // Thread first: the hosted foreign key may be RESTRICT.
        // Thread first, so a RESTRICT foreign key on the hosted table cannot block the ticket delete.
        let thread = self
            .table(Method::DELETE, COMMENTS_TABLE)
            .query(&[("ticket_id", eq(id))])
            .send()
            .await?;
        check(thread).await?;

        let deleted = self
            .ticket_rows(
                self.table(Method::DELETE, TICKETS_TABLE)
                    .header("Prefer", RETURN_REPRESENTATION)
                    .query(&[("id", eq(id))]),
            )
            .await?;
        if deleted.is_empty() {
            return Err(TicketError::NotFound(id));
        }
        Ok(())
    }

    async fn list_comments(&self, ticket_id: i64) -> Result<Vec<TicketComment>, TicketError> {
        let response = self
            .table(Method::GET, COMMENTS_TABLE)
            .query(&[
                ("select", "*".to_string()),
                ("ticket_id", eq(ticket_id)),
                ("order", "created_at.asc,id.asc".to_string()),
            ])
            .send()
            .await?;
        rows(response).await
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<TicketComment, TicketError> {
        let response = self
            .table(Method::POST, COMMENTS_TABLE)
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&comment)
            .send()
            .await?;
        rows::<TicketComment>(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| TicketError::Store("insert returned no row".to_string()))
    }
}
