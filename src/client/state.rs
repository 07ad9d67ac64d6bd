//! Module `state`
//!
//! Lifecycle of a player connection.

use std::fmt;

/// Where a player handler is in its lifecycle.
///
/// `Connecting -> AwaitOpponent (first seat only) -> ActiveTurnLoop -> GameOver -> Closed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerState {
    Connecting,
    AwaitOpponent,
    ActiveTurnLoop,
    GameOver,
    Closed,
}

impl HandlerState {
    /// Returns whether moving from `self` to `next` follows the lifecycle.
    pub fn can_transition_to(self, next: HandlerState) -> bool {
        use HandlerState::*;
        matches!(
            (self, next),
            (Connecting, AwaitOpponent)
                | (Connecting, ActiveTurnLoop)
                | (AwaitOpponent, ActiveTurnLoop)
                | (Connecting | AwaitOpponent | ActiveTurnLoop, GameOver)
                | (GameOver, Closed)
        )
    }
}

impl fmt::Display for HandlerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandlerState::Connecting => "connecting",
            HandlerState::AwaitOpponent => "awaiting opponent",
            HandlerState::ActiveTurnLoop => "playing",
            HandlerState::GameOver => "game over",
            HandlerState::Closed => "closed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::HandlerState::*;

    #[test]
    fn test_lifecycle_order() {
        assert!(Connecting.can_transition_to(AwaitOpponent));
        assert!(Connecting.can_transition_to(ActiveTurnLoop));
        assert!(AwaitOpponent.can_transition_to(ActiveTurnLoop));
        assert!(ActiveTurnLoop.can_transition_to(GameOver));
        assert!(AwaitOpponent.can_transition_to(GameOver));
        assert!(GameOver.can_transition_to(Closed));
    }

    #[test]
    fn test_no_going_back() {
        assert!(!ActiveTurnLoop.can_transition_to(AwaitOpponent));
        assert!(!GameOver.can_transition_to(ActiveTurnLoop));
        assert!(!Closed.can_transition_to(Connecting));
        assert!(!Connecting.can_transition_to(Closed));
    }
}
