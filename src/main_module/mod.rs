//! Application wiring: store selection, router assembly and the HTTP server

mod bootstrap;
mod health;
mod server;
mod shutdown;

pub use bootstrap::*;
pub use health::*;
pub use server::*;
pub use shutdown::*;
