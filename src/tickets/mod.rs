pub mod board;
pub mod comments;
pub mod contact;
pub mod error;
pub mod handlers;
pub mod images;
pub mod migrations;
pub mod service;
pub mod store;
pub mod types;


use axum::{
    routing::{get, put},
    Router,
};
use std::sync::Arc;

use crate::core::shared::state::AppState;
use crate::core::urls::ApiUrls;

pub use board::TicketBoard;
pub use comments::CommentThread;
pub use error::TicketError;
pub use images::resolve_ticket_images;
pub use service::TicketService;
pub use store::{MemoryTicketStore, PgTicketStore, RestTicketStore, TicketStore};
pub use types::{
    NewComment, NewTicket, SupportTicket, TicketAction, TicketComment, TicketDetail, TicketStats,
    TicketStatus,
};

pub fn configure_tickets_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(ApiUrls::TICKETS, get(handlers::list_tickets))
        .route(ApiUrls::TICKET_STATS, get(handlers::get_ticket_stats))
        .route(
            ApiUrls::TICKET_BY_ID,
            get(handlers::get_ticket).delete(handlers::delete_ticket),
        )
        .route(ApiUrls::TICKET_READ, put(handlers::mark_read))
        .route(ApiUrls::TICKET_CLAIM, put(handlers::claim_ticket))
        .route(ApiUrls::TICKET_COMPLETE, put(handlers::complete_ticket))
        .route(
            ApiUrls::TICKET_COMMENTS,
            get(handlers::list_comments).post(handlers::add_comment),
        )
        .route(ApiUrls::TICKET_IMAGES, get(handlers::list_images))
}
