pub mod schema;
pub mod state;
pub mod utils;

pub use schema::*;
pub use utils::{create_conn, DbPool};
