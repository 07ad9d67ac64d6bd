//! Tic-Tac-Toe Server - Entry Point
//!
//! Pairs connecting players into two-seat games and referees every move.

use log::{error, info};

use tictactoe_server::error::ServerError;
use tictactoe_server::{Server, ServerConfig};

#[tokio::main]
async fn main() {
    // RUST_LOG overrides the default `info` filter
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Launching tic-tac-toe server...");

    if let Err(e) = run().await {
        error!("Server startup failed: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), ServerError> {
    let config = ServerConfig::load()?;
    let server = Server::bind(config).await?;
    server.start().await;
    Ok(())
}
