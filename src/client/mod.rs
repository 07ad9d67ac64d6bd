//! Player connections
//!
//! One handler per connected player: it reads moves off its own socket,
//! submits them to the session and writes whatever the session queues for it.

pub mod handler;
pub mod state;

pub use handler::PlayerHandler;
pub use state::HandlerState;
