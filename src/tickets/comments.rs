use log::error;

use super::error::TicketError;
use super::store::TicketStore;
use super::types::{NewComment, TicketComment};

pub(crate) fn required(field: &str, value: &str) -> Result<String, TicketError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TicketError::Validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// Thread of a ticket, oldest comment first.
pub async fn list_comments(
    store: &dyn TicketStore,
    ticket_id: i64,
) -> Result<Vec<TicketComment>, TicketError> {
    store.list_comments(ticket_id).await.map_err(|e| {
        error!("Error fetching comments for ticket #{ticket_id}: {e}");
        e
    })
}

/// Appends a comment and returns the reloaded thread, which also carries comments
/// other staff added in the meantime.
pub async fn add_comment(
    store: &dyn TicketStore,
    ticket_id: i64,
    author: &str,
    text: &str,
) -> Result<Vec<TicketComment>, TicketError> {
    let author = required("author", author)?;
    let text = required("comment text", text)?;

    store
        .insert_comment(NewComment {
            ticket_id,
            text,
            author,
        })
        .await
        .map_err(|e| {
            error!("Error adding comment to ticket #{ticket_id}: {e}");
            e
        })?;

    list_comments(store, ticket_id).await
}

/// Visible thread of one open ticket. Failed loads keep what was shown before.
#[derive(Debug, Clone)]
pub struct CommentThread {
    ticket_id: i64,
    comments: Vec<TicketComment>,
}

impl CommentThread {
    pub fn new(ticket_id: i64) -> Self {
        Self {
            ticket_id,
            comments: Vec::new(),
        }
    }

    pub fn comments(&self) -> &[TicketComment] {
        &self.comments
    }

    pub async fn load(&mut self, store: &dyn TicketStore) -> Result<&[TicketComment], TicketError> {
        self.comments = list_comments(store, self.ticket_id).await?;
        Ok(&self.comments)
    }

    pub async fn add(
        &mut self,
        store: &dyn TicketStore,
        author: &str,
        text: &str,
    ) -> Result<&[TicketComment], TicketError> {
        self.comments = add_comment(store, self.ticket_id, author, text).await?;
        Ok(&self.comments)
    }
}
