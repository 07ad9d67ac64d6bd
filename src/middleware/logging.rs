//! Logging middleware
//!
//! Log lines shared by the acceptor and the player handlers.

use log::{debug, info, warn};
use std::net::SocketAddr;

use crate::error::ProtocolError;
use crate::game::{Cell, MoveOutcome};
use crate::session::{Seat, SessionEnd, SessionId};

/// Log a player taking a seat
pub fn log_connection(addr: SocketAddr, seat: Seat, session: SessionId) {
    info!(
        "Client {} connected as {} (seat {}) in session {}",
        addr,
        seat,
        seat.index(),
        session
    );
}

/// Log a move that went through the turn gate
pub fn log_move(addr: SocketAddr, seat: Seat, cell: Cell, outcome: MoveOutcome) {
    match outcome {
        MoveOutcome::Valid | MoveOutcome::Invalid => {
            debug!("{} ({}) played {}: {:?}", addr, seat, cell, outcome)
        }
        MoveOutcome::Win(_) => info!("{} ({}) won with {}", addr, seat, cell),
        MoveOutcome::Draw => info!("{} ({}) drew the game with {}", addr, seat, cell),
    }
}

/// Log a line that could not be read as a move
pub fn log_malformed(addr: SocketAddr, seat: Seat, err: &ProtocolError) {
    warn!("Malformed move from {} ({}): {}", addr, seat, err);
}

/// Log how a session finished
pub fn log_session_end(session: SessionId, end: Option<SessionEnd>) {
    match end {
        Some(SessionEnd::Won(seat)) => info!("Session {} finished: {} won", session, seat),
        Some(SessionEnd::Draw) => info!("Session {} finished: draw", session),
        Some(SessionEnd::Abandoned(seat)) => {
            warn!("Session {} finished: {} left early", session, seat)
        }
        None => warn!("Session {} torn down before it ended", session),
    }
}
