//! Server middleware
//!
//! Provides logging helpers.

pub mod logging;
