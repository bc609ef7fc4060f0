use std::sync::Arc;

use crate::core::config::AppConfig;
use crate::llm::{ChatRelay, LLMProvider};
use crate::tickets::{TicketService, TicketStore};

pub struct AppState {
    pub config: AppConfig,
    pub tickets: TicketService,
    pub relay: ChatRelay,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn TicketStore>,
        provider: Arc<dyn LLMProvider>,
    ) -> Self {
        Self {
            config,
            tickets: TicketService::new(store),
            relay: ChatRelay::new(provider),
        }
    }
}
