//! Server core functionality
//!
//! Accepts connections and pairs them into game sessions.

pub mod core;

pub use core::Server;
