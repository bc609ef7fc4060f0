use dotenvy::dotenv;
use log::{error, info};

use helpdesk::core::config::AppConfig;
use helpdesk::main_module::{create_app_state, run_axum_server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Starting helpdesk {}", env!("CARGO_PKG_VERSION"));

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let state = create_app_state(config).await?;
    run_axum_server(state).await?;

    info!("Server stopped");
    Ok(())
}
