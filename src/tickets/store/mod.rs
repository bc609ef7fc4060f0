//! Persistence seam for tickets and their comment threads.
//!
//! Every backend speaks the same two logical tables (`support_tickets`,
//! `ticket_comments`). Reads are ordered by `created_at`: tickets newest first,
//! comments oldest first, ties broken by id in the same direction.

use async_trait::async_trait;

use super::error::TicketError;
use super::types::{NewComment, NewTicket, SupportTicket, TicketAction, TicketComment};

mod memory;
mod postgres;
mod rest;

pub use memory::MemoryTicketStore;
pub use postgres::PgTicketStore;
pub use rest::RestTicketStore;

pub const TICKETS_TABLE: &str = "support_tickets";
pub const COMMENTS_TABLE: &str = "ticket_comments";

#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn list_tickets(&self) -> Result<Vec<SupportTicket>, TicketError>;

    async fn get_ticket(&self, id: i64) -> Result<SupportTicket, TicketError>;

    async fn insert_ticket(&self, ticket: NewTicket) -> Result<SupportTicket, TicketError>;

    /// Sets the read flag and returns the stored row.
    async fn set_read(&self, id: i64, is_read: bool) -> Result<SupportTicket, TicketError>;

    /// Checks the action against the stored status, writes the new status (and owner
    /// on claim) and appends the action's audit comment. Backends that support
    /// transactions do all three atomically.
    async fn apply(&self, id: i64, action: &TicketAction) -> Result<SupportTicket, TicketError>;

    /// Deletes the ticket together with its thread.
    async fn delete_ticket(&self, id: i64) -> Result<(), TicketError>;

    async fn list_comments(&self, ticket_id: i64) -> Result<Vec<TicketComment>, TicketError>;

    async fn insert_comment(&self, comment: NewComment) -> Result<TicketComment, TicketError>;
}
