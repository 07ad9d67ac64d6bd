//! Turn gate
//!
//! `Session` is the aggregate both player handlers share. All mutable game
//! state sits behind one async mutex, and `changed` is the broadcast signal
//! every waiter parks on. A placement, its evaluation, the turn switch and
//! the resulting notices all happen under a single lock acquisition, so no
//! task ever observes a half-applied move.

use std::pin::pin;

use log::{debug, info, warn};
use tokio::sync::{Mutex, Notify, mpsc};

use crate::error::SessionError;
use crate::game::{Board, Cell, GameStatus, MoveOutcome, rules};
use crate::protocol::{ServerMessage, move_notices};
use crate::session::Seat;

/// Queue of outbound messages for one seat, drained by that seat's writer.
pub type Outbox = mpsc::UnboundedSender<ServerMessage>;

pub type SessionId = u64;

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Won(Seat),
    Draw,
    /// The given seat's transport failed before the game finished.
    Abandoned(Seat),
}

struct SessionState {
    board: Board,
    current: Seat,
    opponent_connected: bool,
    ended: Option<SessionEnd>,
    outboxes: [Option<Outbox>; 2],
}

impl SessionState {
    fn send(&self, seat: Seat, message: ServerMessage) {
        if let Some(outbox) = &self.outboxes[seat.index()] {
            if outbox.send(message).is_err() {
                debug!("Dropping {:?} for {}: writer gone", message, seat);
            }
        }
    }
}

pub struct Session {
    id: SessionId,
    state: Mutex<SessionState>,
    changed: Notify,
}

impl Session {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            state: Mutex::new(SessionState {
                board: Board::new(),
                current: Seat::First,
                opponent_connected: false,
                ended: None,
                outboxes: [None, None],
            }),
            changed: Notify::new(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Binds `seat` to the queue its handler writes from.
    ///
    /// Fails with `GameOver` once the session has ended, so a late arrival is
    /// never seated in a finished game.
    pub async fn bind(&self, seat: Seat, outbox: Outbox) -> Result<(), SessionError> {
        let mut state = self.state.lock().await;
        if state.ended.is_some() {
            return Err(SessionError::GameOver);
        }
        state.outboxes[seat.index()] = Some(outbox);
        Ok(())
    }

    /// Releases the session's handle on `seat`'s queue so the writer can drain
    /// and finish.
    pub async fn unbind(&self, seat: Seat) {
        self.state.lock().await.outboxes[seat.index()] = None;
    }

    /// Records that the second seat has joined and releases the first seat's
    /// opening wait.
    pub async fn opponent_joined(&self) {
        self.state.lock().await.opponent_connected = true;
        info!("Session {}: both players connected", self.id);
        self.changed.notify_waiters();
    }

    /// Blocks until the second seat has joined.
    pub async fn await_opponent(&self) -> Result<(), SessionError> {
        self.wait_until(|state| state.opponent_connected).await
    }

    /// Blocks until it is `seat`'s turn.
    ///
    /// Fails with `GameOver` as soon as the session ends, whether or not the
    /// caller was waiting at that moment.
    pub async fn await_turn(&self, seat: Seat) -> Result<(), SessionError> {
        self.wait_until(|state| state.current == seat).await
    }

    /// Resolves once the session has ended.
    pub async fn finished(&self) {
        // A guard that never holds only returns once the game is over.
        let _ = self.wait_until(|_| false).await;
    }

    /// Places `seat`'s mark on `cell` if it is free, evaluates the board and
    /// either ends the game or passes the turn.
    ///
    /// The mover's reply and the opponent's notice are queued before the lock
    /// is released.
    pub async fn commit_move(&self, seat: Seat, cell: Cell) -> Result<MoveOutcome, SessionError> {
        let mut state = self.state.lock().await;
        if state.ended.is_some() {
            return Err(SessionError::GameOver);
        }
        if state.current != seat {
            return Err(SessionError::NotYourTurn(seat));
        }

        let mark = seat.mark();
        if let Err(e) = state.board.place(cell, mark) {
            debug!("Session {}: {} rejected: {}", self.id, seat, e);
            state.send(seat, ServerMessage::InvalidMove);
            return Ok(MoveOutcome::Invalid);
        }

        let outcome = match rules::evaluate(&state.board, mark) {
            GameStatus::Won(_) => {
                state.ended = Some(SessionEnd::Won(seat));
                MoveOutcome::Win(cell)
            }
            GameStatus::Draw => {
                state.ended = Some(SessionEnd::Draw);
                MoveOutcome::Draw
            }
            GameStatus::InProgress => {
                state.current = seat.other();
                MoveOutcome::Valid
            }
        };

        let (to_mover, to_opponent) = move_notices(outcome, cell);
        state.send(seat, to_mover);
        if let Some(message) = to_opponent {
            state.send(seat.other(), message);
        }
        debug!("Session {}: board {}", self.id, state.board);
        drop(state);

        self.changed.notify_waiters();
        Ok(outcome)
    }

    /// Waits for `seat`'s turn, then commits the move.
    pub async fn submit(&self, seat: Seat, cell: Cell) -> Result<MoveOutcome, SessionError> {
        self.await_turn(seat).await?;
        self.commit_move(seat, cell).await
    }

    /// Ends the session because `seat`'s connection failed. The opponent is
    /// not sent anything; its handler just sees the session end.
    pub async fn abandon(&self, seat: Seat) {
        let mut state = self.state.lock().await;
        state.outboxes[seat.index()] = None;
        if state.ended.is_none() {
            state.ended = Some(SessionEnd::Abandoned(seat));
            warn!("Session {}: abandoned by {}", self.id, seat);
        }
        drop(state);

        self.changed.notify_waiters();
    }

    pub async fn is_over(&self) -> bool {
        self.state.lock().await.ended.is_some()
    }

    pub async fn end(&self) -> Option<SessionEnd> {
        self.state.lock().await.ended
    }

    pub async fn current_seat(&self) -> Seat {
        self.state.lock().await.current
    }

    /// Snapshot of the board.
    pub async fn board(&self) -> Board {
        self.state.lock().await.board.clone()
    }

    /// Parks until `ready` holds or the session ends.
    ///
    /// Interest in `changed` is registered before the state is inspected, so a
    /// notification sent between the check and the await is not lost. The
    /// guard is re-checked after every wake.
    async fn wait_until<F>(&self, ready: F) -> Result<(), SessionError>
    where
        F: Fn(&SessionState) -> bool,
    {
        loop {
            let mut notified = pin!(self.changed.notified());
            notified.as_mut().enable();

            {
                let state = self.state.lock().await;
                if state.ended.is_some() {
                    return Err(SessionError::GameOver);
                }
                if ready(&*state) {
                    return Ok(());
                }
            }

            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::time::timeout;

    const BLOCKED: Duration = Duration::from_millis(50);
    const WAKE: Duration = Duration::from_secs(2);

    fn cell(index: usize) -> Cell {
        Cell::new(index).unwrap()
    }

    async fn session() -> (
        Arc<Session>,
        UnboundedReceiver<ServerMessage>,
        UnboundedReceiver<ServerMessage>,
    ) {
        let session = Arc::new(Session::new(1));
        let (x_tx, x_rx) = mpsc::unbounded_channel();
        let (o_tx, o_rx) = mpsc::unbounded_channel();
        session.bind(Seat::First, x_tx).await.unwrap();
        session.bind(Seat::Second, o_tx).await.unwrap();
        session.opponent_joined().await;
        (session, x_rx, o_rx)
    }

    fn drain(rx: &mut UnboundedReceiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = rx.try_recv() {
            messages.push(message);
        }
        messages
    }

    async fn play(session: &Session, moves: &[usize]) -> MoveOutcome {
        let mut seat = Seat::First;
        let mut last = MoveOutcome::Invalid;
        for &index in moves {
            last = session.submit(seat, cell(index)).await.unwrap();
            seat = seat.other();
        }
        last
    }

    #[tokio::test]
    async fn test_valid_move_switches_turn() {
        let (session, mut x_rx, mut o_rx) = session().await;

        let outcome = session.commit_move(Seat::First, cell(0)).await.unwrap();

        assert_eq!(outcome, MoveOutcome::Valid);
        assert_eq!(session.current_seat().await, Seat::Second);
        assert_eq!(drain(&mut x_rx), vec![ServerMessage::ValidMove]);
        assert_eq!(drain(&mut o_rx), vec![ServerMessage::OpponentMoved(cell(0))]);
    }

    #[tokio::test]
    async fn test_occupied_cell_is_invalid_and_keeps_turn() {
        let (session, mut x_rx, mut o_rx) = session().await;
        session.commit_move(Seat::First, cell(4)).await.unwrap();
        drain(&mut x_rx);
        drain(&mut o_rx);
        let before = session.board().await;

        let outcome = session.commit_move(Seat::Second, cell(4)).await.unwrap();

        assert_eq!(outcome, MoveOutcome::Invalid);
        assert_eq!(session.current_seat().await, Seat::Second);
        assert_eq!(session.board().await, before);
        assert_eq!(drain(&mut o_rx), vec![ServerMessage::InvalidMove]);
        assert!(drain(&mut x_rx).is_empty());

        // Mover retries and gets through.
        let outcome = session.commit_move(Seat::Second, cell(0)).await.unwrap();
        assert_eq!(outcome, MoveOutcome::Valid);
        assert_eq!(session.current_seat().await, Seat::First);
    }

    #[tokio::test]
    async fn test_own_cell_is_invalid() {
        let (session, _x_rx, _o_rx) = session().await;
        play(&session, &[0, 4]).await;

        let outcome = session.commit_move(Seat::First, cell(0)).await.unwrap();
        assert_eq!(outcome, MoveOutcome::Invalid);
        assert_eq!(session.current_seat().await, Seat::First);
    }

    #[tokio::test]
    async fn test_commit_out_of_turn_is_refused() {
        let (session, _x_rx, _o_rx) = session().await;

        let err = session.commit_move(Seat::Second, cell(0)).await.unwrap_err();

        assert_eq!(err, SessionError::NotYourTurn(Seat::Second));
        assert_eq!(session.board().await.marks_placed(), 0);
    }

    #[tokio::test]
    async fn test_out_of_turn_submit_waits_for_turn() {
        let (session, _x_rx, _o_rx) = session().await;

        let waiting = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.submit(Seat::Second, cell(4)).await })
        };

        // Still parked and the board is untouched.
        tokio::time::sleep(BLOCKED).await;
        assert!(!waiting.is_finished());
        assert_eq!(session.board().await.marks_placed(), 0);

        session.submit(Seat::First, cell(0)).await.unwrap();

        let outcome = timeout(WAKE, waiting).await.unwrap().unwrap().unwrap();
        assert_eq!(outcome, MoveOutcome::Valid);
        assert_eq!(session.board().await.marks_placed(), 2);
        assert_eq!(session.current_seat().await, Seat::First);
    }

    #[tokio::test]
    async fn test_win_ends_game_without_switching_turn() {
        let (session, mut x_rx, mut o_rx) = session().await;

        let outcome = play(&session, &[0, 4, 1, 8, 2]).await;

        assert_eq!(outcome, MoveOutcome::Win(cell(2)));
        assert_eq!(session.end().await, Some(SessionEnd::Won(Seat::First)));
        assert_eq!(session.current_seat().await, Seat::First);
        assert_eq!(drain(&mut x_rx).last(), Some(&ServerMessage::YouWon(cell(2))));
        assert_eq!(
            drain(&mut o_rx).last(),
            Some(&ServerMessage::OpponentWon(cell(2)))
        );

        let err = session.submit(Seat::Second, cell(3)).await.unwrap_err();
        assert_eq!(err, SessionError::GameOver);
    }

    #[tokio::test]
    async fn test_full_board_is_draw() {
        let (session, mut x_rx, mut o_rx) = session().await;

        let outcome = play(&session, &[0, 1, 2, 4, 3, 5, 7, 6, 8]).await;

        assert_eq!(outcome, MoveOutcome::Draw);
        assert_eq!(session.end().await, Some(SessionEnd::Draw));
        assert!(rules::is_full(&session.board().await));
        assert_eq!(drain(&mut x_rx).last(), Some(&ServerMessage::TieForMover));
        assert_eq!(drain(&mut o_rx).last(), Some(&ServerMessage::TieForOpponent));
    }

    #[tokio::test]
    async fn test_every_cell_marked_at_most_once() {
        let (session, _x_rx, _o_rx) = session().await;
        let mut seat = Seat::First;
        let mut placed = 0;

        for index in [4, 4, 0, 0, 8, 2, 6, 3] {
            let outcome = session.submit(seat, cell(index)).await.unwrap();
            if outcome != MoveOutcome::Invalid {
                placed += 1;
                if outcome.is_terminal() {
                    break;
                }
                seat = seat.other();
            }
            assert_eq!(session.board().await.marks_placed(), placed);
        }
    }

    #[tokio::test]
    async fn test_game_over_wakes_waiting_seat() {
        let (session, _x_rx, _o_rx) = session().await;
        play(&session, &[0, 3, 1, 4]).await;

        let waiting = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.submit(Seat::Second, cell(8)).await })
        };
        tokio::time::sleep(BLOCKED).await;

        let outcome = session.submit(Seat::First, cell(2)).await.unwrap();
        assert_eq!(outcome, MoveOutcome::Win(cell(2)));

        let result = timeout(WAKE, waiting).await.unwrap().unwrap();
        assert_eq!(result, Err(SessionError::GameOver));
        assert_eq!(session.board().await.marks_placed(), 5);
    }

    #[tokio::test]
    async fn test_abandon_releases_every_waiter() {
        let session = Arc::new(Session::new(7));

        let opening = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.await_opponent().await })
        };
        let finished = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.finished().await })
        };
        tokio::time::sleep(BLOCKED).await;
        assert!(!opening.is_finished());
        assert!(!finished.is_finished());

        session.abandon(Seat::First).await;

        let result = timeout(WAKE, opening).await.unwrap().unwrap();
        assert_eq!(result, Err(SessionError::GameOver));
        timeout(WAKE, finished).await.unwrap().unwrap();
        assert_eq!(session.end().await, Some(SessionEnd::Abandoned(Seat::First)));
    }

    #[tokio::test]
    async fn test_abandon_after_end_keeps_result() {
        let (session, _x_rx, _o_rx) = session().await;
        play(&session, &[0, 4, 1, 8, 2]).await;

        session.abandon(Seat::Second).await;

        assert_eq!(session.end().await, Some(SessionEnd::Won(Seat::First)));
    }

    #[tokio::test]
    async fn test_ended_session_refuses_new_seat() {
        let session = Session::new(5);
        let (x_tx, _x_rx) = mpsc::unbounded_channel();
        session.bind(Seat::First, x_tx).await.unwrap();
        session.abandon(Seat::First).await;

        let (o_tx, o_rx) = mpsc::unbounded_channel();
        let err = session.bind(Seat::Second, o_tx).await.unwrap_err();

        assert_eq!(err, SessionError::GameOver);
        // Nothing kept a handle on the refused queue.
        assert!(o_rx.is_closed());
    }

    #[tokio::test]
    async fn test_opponent_joined_releases_opening_wait() {
        let session = Arc::new(Session::new(3));
        let opening = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.await_opponent().await })
        };
        tokio::time::sleep(BLOCKED).await;
        assert!(!opening.is_finished());

        session.opponent_joined().await;

        assert_eq!(timeout(WAKE, opening).await.unwrap().unwrap(), Ok(()));
    }
}
