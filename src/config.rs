//! Configuration management for the tic-tac-toe server
//!
//! Built-in defaults, optionally overridden by `config.toml` and then by
//! `TICTACTOE__*` environment variables.

use config::{Config, Environment, File};
use serde::Deserialize;

/// Server configuration
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// IP address to listen on
    pub bind_address: String,

    /// Port players connect to
    pub port: u16,

    /// Maximum number of sessions running at once
    pub max_sessions: usize,

    /// Longest client line accepted as a move, in bytes
    pub max_line_length: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 12345,
            max_sessions: 64,
            max_line_length: 64,
        }
    }
}

impl ServerConfig {
    /// Load configuration from `config.toml` (if present) with environment
    /// overrides, e.g. `TICTACTOE__PORT=4000`.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from the given file (extension optional, may be
    /// missing) with environment overrides.
    pub fn load_from(path: &str) -> Result<Self, config::ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("TICTACTOE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Get bind address and port as a socket address string
    pub fn listen_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.port == 0 {
            return Err(config::ConfigError::Message("port cannot be 0".into()));
        }

        if self.bind_address.is_empty() {
            return Err(config::ConfigError::Message(
                "bind_address cannot be empty".into(),
            ));
        }

        if self.max_sessions == 0 {
            return Err(config::ConfigError::Message(
                "max_sessions must be greater than 0".into(),
            ));
        }

        if self.max_line_length == 0 {
            return Err(config::ConfigError::Message(
                "max_line_length must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}
