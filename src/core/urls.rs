#[derive(Debug)]
pub struct ApiUrls;

impl ApiUrls {
    pub const HEALTH: &'static str = "/health";

    // Tickets - JSON APIs
    pub const TICKETS: &'static str = "/api/tickets";
    pub const TICKET_STATS: &'static str = "/api/tickets/stats";
    pub const TICKET_BY_ID: &'static str = "/api/tickets/:id";
    pub const TICKET_READ: &'static str = "/api/tickets/:id/read";
    pub const TICKET_CLAIM: &'static str = "/api/tickets/:id/claim";
    pub const TICKET_COMPLETE: &'static str = "/api/tickets/:id/complete";
    pub const TICKET_COMMENTS: &'static str = "/api/tickets/:id/comments";
    pub const TICKET_IMAGES: &'static str = "/api/tickets/:id/images";

    // Chat relay
    pub const CHAT: &'static str = "/api/chat";
    pub const CHAT_OPENAI: &'static str = "/api/openai";
}
