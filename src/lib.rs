pub mod client;
pub mod config;
pub mod error;
pub mod game;
pub mod middleware;
pub mod protocol;
pub mod server;
pub mod session;

pub use crate::config::ServerConfig;
pub use crate::server::Server;
