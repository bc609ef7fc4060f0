use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Mutex, MutexGuard};

use super::TicketStore;
use crate::tickets::error::TicketError;
use crate::tickets::types::{
    NewComment, NewTicket, SupportTicket, TicketAction, TicketComment, TicketStatus,
};

#[derive(Debug, Default)]
struct Tables {
    tickets: Vec<SupportTicket>,
    comments: Vec<TicketComment>,
    next_ticket_id: i64,
    next_comment_id: i64,
}

impl Tables {
    fn ticket_mut(&mut self, id: i64) -> Result<&mut SupportTicket, TicketError> {
        self.tickets
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(TicketError::NotFound(id))
    }

    fn push_comment(&mut self, comment: NewComment) -> TicketComment {
        self.next_comment_id += 1;
        let stored = TicketComment {
            id: self.next_comment_id,
            ticket_id: comment.ticket_id,
            text: comment.text,
            author: comment.author,
            created_at: Utc::now(),
        };
        self.comments.push(stored.clone());
        stored
    }
}

/// In-process tables for development and tests. Each operation runs under one
/// lock, so `apply` is atomic here.
#[derive(Debug, Default)]
pub struct MemoryTicketStore {
    tables: Mutex<Tables>,
}

impl MemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, TicketError> {
        self.tables
            .lock()
            .map_err(|_| TicketError::Store("memory store lock poisoned".to_string()))
    }

    /// Inserts a fully specified row, keeping its id and timestamp.
    pub fn seed_ticket(&self, ticket: SupportTicket) -> Result<(), TicketError> {
        let mut tables = self.lock()?;
        tables.next_ticket_id = tables.next_ticket_id.max(ticket.id);
        tables.tickets.retain(|t| t.id != ticket.id);
        tables.tickets.push(ticket);
        Ok(())
    }

    /// Inserts a fully specified comment, keeping its id and timestamp.
    pub fn seed_comment(&self, comment: TicketComment) -> Result<(), TicketError> {
        let mut tables = self.lock()?;
        tables.next_comment_id = tables.next_comment_id.max(comment.id);
        tables.comments.retain(|c| c.id != comment.id);
        tables.comments.push(comment);
        Ok(())
    }
}

#[async_trait]
impl TicketStore for MemoryTicketStore {
    async fn list_tickets(&self) -> Result<Vec<SupportTicket>, TicketError> {
        let mut tickets = self.lock()?.tickets.clone();
        tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(tickets)
    }

    async fn get_ticket(&self, id: i64) -> Result<SupportTicket, TicketError> {
        self.lock()?
            .tickets
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(TicketError::NotFound(id))
    }

    async fn insert_ticket(&self, ticket: NewTicket) -> Result<SupportTicket, TicketError> {
        let mut tables = self.lock()?;
        tables.next_ticket_id += 1;
        let stored = SupportTicket {
            id: tables.next_ticket_id,
            name: ticket.name,
            email: ticket.email,
            phone: ticket.phone,
            error_description: ticket.error_description,
            image_url: ticket.image_url,
            images: ticket.images,
            is_read: false,
            status: TicketStatus::New,
            assigned_to: None,
            created_at: Utc::now(),
        };
        tables.tickets.push(stored.clone());
        Ok(stored)
    }

    async fn set_read(&self, id: i64, is_read: bool) -> Result<SupportTicket, TicketError> {
        let mut tables = self.lock()?;
        let ticket = tables.ticket_mut(id)?;
        ticket.is_read = is_read;
        Ok(ticket.clone())
    }

    async fn apply(&self, id: i64, action: &TicketAction) -> Result<SupportTicket, TicketError> {
        let mut tables = self.lock()?;
        let ticket = tables.ticket_mut(id)?;
        if !action.permits(ticket.status) {
            return Err(TicketError::InvalidTransition {
                id,
                from: ticket.status,
                action: action.name(),
            });
        }
        action.apply_to(ticket);
        let updated = ticket.clone();
        tables.push_comment(action.audit_comment(id));
        Ok(updated)
    }

    async fn delete_ticket(&self, id: i64) -> Result<(), TicketError> {
        let mut tables = self.lock()?;
        let before = tables.tickets.len();
        tables.tickets.retain(|t| t.id != id);
        if tables.tickets.len() == before {
            return Err(TicketError::NotFound(id));
        }
        tables.comments.retain(|c| c.ticket_id != id);
        Ok(())
    }

    async fn list_comments(&self, ticket_id: i64) -> Result<Vec<TicketComment>, TicketError> {
        let mut comments: Vec<TicketComment> = self
            .lock()?
            .comments
            .iter()
            .filter(|c| c.ticket_id == ticket_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(comments)
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<TicketComment, TicketError> {
        let mut tables = self.lock()?;
        if !tables.tickets.iter().any(|t| t.id == comment.ticket_id) {
            return Err(TicketError::NotFound(comment.ticket_id));
        }
        Ok(tables.push_comment(comment))
    }
}
