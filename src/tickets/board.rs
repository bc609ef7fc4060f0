//! Dashboard state for one staff session, independent of any UI toolkit.
//!
//! The board owns the visible ticket list, the open ticket and its thread. After a
//! write it reloads the whole list from the store instead of patching it, so
//! changes by other staff show up and nothing is assumed from the request alone.

use log::warn;

use super::comments::CommentThread;
use super::error::TicketError;
use super::service::TicketService;
use super::types::{SupportTicket, TicketComment, TicketStats};

pub struct TicketBoard {
    service: TicketService,
    tickets: Vec<SupportTicket>,
    selected: Option<SupportTicket>,
    thread: Option<CommentThread>,
    stale: bool,
}

impl TicketBoard {
    pub fn new(service: TicketService) -> Self {
        Self {
            service,
            tickets: Vec::new(),
            selected: None,
            thread: None,
            stale: true,
        }
    }

    pub fn tickets(&self) -> &[SupportTicket] {
        &self.tickets
    }

    pub fn unread_count(&self) -> usize {
        self.tickets.iter().filter(|t| !t.is_read).count()
    }

    pub fn stats(&self) -> TicketStats {
        TicketStats::from_tickets(&self.tickets)
    }

    pub fn selected(&self) -> Option<&SupportTicket> {
        self.selected.as_ref()
    }

    pub fn thread(&self) -> &[TicketComment] {
        self.thread.as_ref().map_or(&[], CommentThread::comments)
    }

    /// True when the last reload after a write failed and the list may lag behind
    /// the store.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Reloads the list. On failure the previous list stays in place.
    pub async fn refresh(&mut self) -> Result<&[SupportTicket], TicketError> {
        let tickets = self.service.list_tickets().await?;
        self.tickets = tickets;
        self.stale = false;
        if let Some(open) = &self.selected {
            let id = open.id;
            self.selected = self.tickets.iter().find(|t| t.id == id).cloned();
            if self.selected.is_none() {
                self.thread = None;
            }
        }
        Ok(&self.tickets)
    }

    async fn refresh_after_write(&mut self) {
        if let Err(e) = self.refresh().await {
            warn!("Ticket list not reloaded after write: {e}");
            self.stale = true;
        }
    }

    /// Opens a ticket: loads its thread, then marks it read if it was unread.
    pub async fn open(&mut self, id: i64) -> Result<(), TicketError> {
        let ticket = match self.tickets.iter().find(|t| t.id == id) {
            Some(t) => t.clone(),
            None => self.service.get_ticket(id).await?,
        };
        let was_read = ticket.is_read;
        self.selected = Some(ticket);

        let mut thread = CommentThread::new(id);
        let loaded = thread.load(self.service.store()).await.map(|_| ());
        self.thread = Some(thread);
        loaded?;

        if !was_read {
            let updated = self.service.mark_read(id).await?;
            self.selected = Some(updated);
            self.refresh_after_write().await;
        }
        Ok(())
    }

    pub fn close(&mut self) {
        self.selected = None;
        self.thread = None;
    }

    fn close_if_open(&mut self, id: i64) {
        if self.selected.as_ref().is_some_and(|t| t.id == id) {
            self.close();
        }
    }

    pub async fn mark_read(&mut self, id: i64) -> Result<SupportTicket, TicketError> {
        let updated = self.service.mark_read(id).await?;
        self.refresh_after_write().await;
        Ok(updated)
    }

    pub async fn claim(&mut self, id: i64, staff: &str) -> Result<SupportTicket, TicketError> {
        let updated = self.service.claim(id, staff).await?;
        self.close_if_open(id);
        self.refresh_after_write().await;
        Ok(updated)
    }

    pub async fn complete(&mut self, id: i64, staff: &str) -> Result<SupportTicket, TicketError> {
        let updated = self.service.complete(id, staff).await?;
        self.close_if_open(id);
        self.refresh_after_write().await;
        Ok(updated)
    }

    pub async fn remove(&mut self, id: i64) -> Result<(), TicketError> {
        self.service.remove(id).await?;
        self.close_if_open(id);
        self.refresh_after_write().await;
        Ok(())
    }

    /// Comments on the open ticket and shows the reloaded thread.
    pub async fn add_comment(&mut self, author: &str, text: &str) -> Result<&[TicketComment], TicketError> {
        let Some(thread) = self.thread.as_mut() else {
            return Err(TicketError::Validation("no ticket is open".to_string()));
        };
        thread.add(self.service.store(), author, text).await
    }
}
