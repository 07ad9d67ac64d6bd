//! Error handling
//!
//! Defines error types for the game server.

pub mod types;

pub use types::*;
