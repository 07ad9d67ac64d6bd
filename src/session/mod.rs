//! Game sessions
//!
//! A session is one game between two seats. It owns the board and the turn
//! gate that serializes both player handlers' access to it.

pub mod gate;
pub mod seat;

pub use gate::{Outbox, Session, SessionEnd, SessionId};
pub use seat::Seat;
