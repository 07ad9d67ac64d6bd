//! Server responses
//!
//! Every message the server writes to a player. Each message is one or more
//! newline-terminated lines.

use crate::game::{Cell, Mark, MoveOutcome};

pub const PLAYER_X_CONNECTED: &str = "Player X connected";
pub const WAITING_FOR_OPPONENT: &str = "Waiting for another player";
pub const PLAYER_O_CONNECTED: &str = "Player O connected, please wait";
pub const OPPONENT_CONNECTED: &str = "Other player connected. Your move.";
pub const VALID_MOVE: &str = "Valid move.";
pub const INVALID_MOVE: &str = "Invalid move, try again";
pub const OPPONENT_MOVED: &str = "Opponent moved";
pub const YOU_WON: &str = "Congratulations you have won";
pub const OPPONENT_WON: &str = "Opponent won";
pub const TIE_MOVER: &str = "Its a tie!";
pub const TIE_OPPONENT: &str = "It's a tie game";
pub const MALFORMED_MOVE: &str = "Malformed move, send a cell index from 0 to 8";
pub const SERVER_FULL: &str = "Server is full, try again later";

/// A message queued for one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerMessage {
    Mark(Mark),
    PlayerXConnected,
    WaitingForOpponent,
    PlayerOConnected,
    OpponentConnected,
    ValidMove,
    InvalidMove,
    OpponentMoved(Cell),
    YouWon(Cell),
    OpponentWon(Cell),
    TieForMover,
    TieForOpponent,
    MalformedMove,
    ServerFull,
}

impl ServerMessage {
    /// Encodes the message as it goes on the wire, trailing newline included.
    pub fn encode(&self) -> String {
        match self {
            ServerMessage::Mark(mark) => format!("{}\n", mark),
            ServerMessage::PlayerXConnected => line(PLAYER_X_CONNECTED),
            ServerMessage::WaitingForOpponent => line(WAITING_FOR_OPPONENT),
            ServerMessage::PlayerOConnected => line(PLAYER_O_CONNECTED),
            ServerMessage::OpponentConnected => line(OPPONENT_CONNECTED),
            ServerMessage::ValidMove => line(VALID_MOVE),
            ServerMessage::InvalidMove => line(INVALID_MOVE),
            ServerMessage::OpponentMoved(cell) => format!("{}\n{}\n", OPPONENT_MOVED, cell),
            ServerMessage::YouWon(cell) => format!("{} {}\n", YOU_WON, cell),
            ServerMessage::OpponentWon(cell) => format!("{} {}\n", OPPONENT_WON, cell),
            ServerMessage::TieForMover => line(TIE_MOVER),
            ServerMessage::TieForOpponent => line(TIE_OPPONENT),
            ServerMessage::MalformedMove => line(MALFORMED_MOVE),
            ServerMessage::ServerFull => line(SERVER_FULL),
        }
    }
}

/// Opening lines queued for a player right after its mark.
pub fn greeting(mark: Mark) -> &'static [ServerMessage] {
    match mark {
        Mark::X => &[ServerMessage::PlayerXConnected, ServerMessage::WaitingForOpponent],
        Mark::O => &[ServerMessage::PlayerOConnected],
    }
}

fn line(text: &str) -> String {
    format!("{}\n", text)
}

/// Messages produced by a committed move: one for the mover and, unless the
/// move was rejected, one for the opponent.
pub fn move_notices(outcome: MoveOutcome, cell: Cell) -> (ServerMessage, Option<ServerMessage>) {
    match outcome {
        MoveOutcome::Valid => (ServerMessage::ValidMove, Some(ServerMessage::OpponentMoved(cell))),
        MoveOutcome::Invalid => (ServerMessage::InvalidMove, None),
        MoveOutcome::Win(cell) => (ServerMessage::YouWon(cell), Some(ServerMessage::OpponentWon(cell))),
        MoveOutcome::Draw => (ServerMessage::TieForMover, Some(ServerMessage::TieForOpponent)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(index: usize) -> Cell {
        Cell::new(index).unwrap()
    }

    #[test]
    fn test_encode_single_lines() {
        assert_eq!(ServerMessage::Mark(Mark::X).encode(), "X\n");
        assert_eq!(ServerMessage::Mark(Mark::O).encode(), "O\n");
        assert_eq!(ServerMessage::ValidMove.encode(), "Valid move.\n");
        assert_eq!(ServerMessage::InvalidMove.encode(), "Invalid move, try again\n");
        assert_eq!(
            ServerMessage::PlayerOConnected.encode(),
            "Player O connected, please wait\n"
        );
        assert_eq!(ServerMessage::TieForMover.encode(), "Its a tie!\n");
        assert_eq!(ServerMessage::TieForOpponent.encode(), "It's a tie game\n");
    }

    #[test]
    fn test_opponent_moved_spans_two_lines() {
        assert_eq!(
            ServerMessage::OpponentMoved(cell(4)).encode(),
            "Opponent moved\n4\n"
        );
    }

    #[test]
    fn test_win_messages_carry_cell() {
        assert_eq!(
            ServerMessage::YouWon(cell(2)).encode(),
            "Congratulations you have won 2\n"
        );
        assert_eq!(ServerMessage::OpponentWon(cell(2)).encode(), "Opponent won 2\n");
    }

    #[test]
    fn test_greeting_per_mark() {
        let first: Vec<String> = greeting(Mark::X).iter().map(|m| m.encode()).collect();
        assert_eq!(first, ["Player X connected\n", "Waiting for another player\n"]);
        assert_eq!(greeting(Mark::O), &[ServerMessage::PlayerOConnected]);
    }

    #[test]
    fn test_move_notices() {
        assert_eq!(
            move_notices(MoveOutcome::Valid, cell(3)),
            (ServerMessage::ValidMove, Some(ServerMessage::OpponentMoved(cell(3))))
        );
        assert_eq!(
            move_notices(MoveOutcome::Invalid, cell(3)),
            (ServerMessage::InvalidMove, None)
        );
        assert_eq!(
            move_notices(MoveOutcome::Win(cell(6)), cell(6)),
            (ServerMessage::YouWon(cell(6)), Some(ServerMessage::OpponentWon(cell(6))))
        );
        assert_eq!(
            move_notices(MoveOutcome::Draw, cell(8)),
            (ServerMessage::TieForMover, Some(ServerMessage::TieForOpponent))
        );
    }
}
