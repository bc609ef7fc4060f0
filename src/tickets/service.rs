use log::{error, info};
use std::sync::Arc;

use super::comments::{self, required};
use super::contact::whatsapp_link;
use super::error::TicketError;
use super::store::TicketStore;
use super::types::{SupportTicket, TicketAction, TicketComment, TicketDetail, TicketStats};

/// Stateless lifecycle operations over a ticket store. Every mutation returns the
/// row as the store echoed it back.
#[derive(Clone)]
pub struct TicketService {
    store: Arc<dyn TicketStore>,
}

impl TicketService {
    pub fn new(store: Arc<dyn TicketStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn TicketStore {
        self.store.as_ref()
    }

    pub async fn list_tickets(&self) -> Result<Vec<SupportTicket>, TicketError> {
        self.store.list_tickets().await.map_err(|e| {
            error!("Error fetching tickets: {e}");
            e
        })
    }

    pub async fn get_ticket(&self, id: i64) -> Result<SupportTicket, TicketError> {
        self.store.get_ticket(id).await
    }

    pub async fn stats(&self) -> Result<TicketStats, TicketError> {
        Ok(TicketStats::from_tickets(&self.list_tickets().await?))
    }

    pub async fn detail(&self, id: i64) -> Result<TicketDetail, TicketError> {
        let ticket = self.store.get_ticket(id).await?;
        let comments = comments::list_comments(self.store(), id).await?;
        Ok(TicketDetail {
            status_label: ticket.status.label(),
            images: ticket.image_urls(),
            contact_url: whatsapp_link(&ticket.phone),
            ticket,
            comments,
        })
    }

    pub async fn mark_read(&self, id: i64) -> Result<SupportTicket, TicketError> {
        self.store.set_read(id, true).await.map_err(|e| {
            error!("Error updating ticket #{id}: {e}");
            e
        })
    }

    pub async fn claim(&self, id: i64, staff: &str) -> Result<SupportTicket, TicketError> {
        let staff = required("staff", staff)?;
        self.apply(id, TicketAction::Claim { staff }).await
    }

    pub async fn complete(&self, id: i64, staff: &str) -> Result<SupportTicket, TicketError> {
        let staff = required("staff", staff)?;
        self.apply(id, TicketAction::Complete { staff }).await
    }

    async fn apply(&self, id: i64, action: TicketAction) -> Result<SupportTicket, TicketError> {
        match self.store.apply(id, &action).await {
            Ok(ticket) => {
                info!("Ticket #{id}: {} by {} -> {}", action.name(), action.staff(), ticket.status);
                Ok(ticket)
            }
            Err(e) => {
                error!("Error applying {} to ticket #{id}: {e}", action.name());
                Err(e)
            }
        }
    }

    pub async fn remove(&self, id: i64) -> Result<(), TicketError> {
        self.store.delete_ticket(id).await.map_err(|e| {
            error!("Error deleting ticket #{id}: {e}");
            e
        })?;
        info!("Ticket #{id} deleted");
        Ok(())
    }

    pub async fn list_comments(&self, ticket_id: i64) -> Result<Vec<TicketComment>, TicketError> {
        comments::list_comments(self.store(), ticket_id).await
    }

    pub async fn add_comment(
        &self,
        ticket_id: i64,
        author: &str,
        text: &str,
    ) -> Result<Vec<TicketComment>, TicketError> {
        comments::add_comment(self.store(), ticket_id, author, text).await
    }
}
