use futures::StreamExt;
use log::{debug, error, info, warn};
use std::io;
use std::net::SocketAddr;
use std::pin::pin;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::codec::FramedRead;

use crate::client::HandlerState;
use crate::config::ServerConfig;
use crate::error::SessionError;
use crate::middleware::logging::{log_connection, log_malformed, log_move};
use crate::protocol::{ClientLine, MoveLineCodec, ServerMessage, greeting, parse_move};
use crate::session::{Outbox, Seat, Session};

type LineReader = FramedRead<OwnedReadHalf, MoveLineCodec>;

/// Why the handler left its loop.
#[derive(Debug)]
enum Exit {
    GameOver,
    Disconnected,
    ReadFailed(io::Error),
    WriteFailed,
}

/// Drives one player's connection for the lifetime of a session.
///
/// The read half stays with the handler; the write half belongs to a writer
/// task that drains this seat's outbox. The session holds a clone of the
/// outbox so move notices for this player are queued in commit order.
pub struct PlayerHandler {
    seat: Seat,
    addr: SocketAddr,
    session: Arc<Session>,
    lines: LineReader,
    outbox: Outbox,
    writer: JoinHandle<()>,
    state: HandlerState,
}

impl PlayerHandler {
    /// Seats a freshly accepted connection in `session`.
    ///
    /// The mark and opening greeting are queued and the outbox is bound before
    /// this returns, so they always precede any move notice. If the session
    /// has already ended the untouched stream is handed back.
    pub async fn join(
        stream: TcpStream,
        addr: SocketAddr,
        seat: Seat,
        session: Arc<Session>,
        config: &ServerConfig,
    ) -> Result<Self, TcpStream> {
        let (outbox, queued) = mpsc::unbounded_channel();

        // The receiver is still in hand, these cannot fail.
        let _ = outbox.send(ServerMessage::Mark(seat.mark()));
        for message in greeting(seat.mark()) {
            let _ = outbox.send(*message);
        }
        if let Err(e) = session.bind(seat, outbox.clone()).await {
            debug!("Session {}: not seating {}: {}", session.id(), addr, e);
            return Err(stream);
        }

        let (read_half, write_half) = stream.into_split();
        let writer = tokio::spawn(write_messages(write_half, queued, addr));
        log_connection(addr, seat, session.id());

        Ok(Self {
            seat,
            addr,
            session,
            lines: FramedRead::new(read_half, MoveLineCodec::new(config.max_line_length)),
            outbox,
            writer,
            state: HandlerState::Connecting,
        })
    }

    pub fn seat(&self) -> Seat {
        self.seat
    }

    /// Runs the handler until the game ends or the connection fails, then
    /// closes the connection.
    pub async fn run(mut self) {
        let pending = if self.seat == Seat::First {
            self.transition(HandlerState::AwaitOpponent);
            match self.await_opponent().await {
                Ok(pending) => pending,
                Err(exit) => return self.close(exit).await,
            }
        } else {
            None
        };

        self.transition(HandlerState::ActiveTurnLoop);
        let exit = self.turn_loop(pending).await;
        self.close(exit).await;
    }

    /// Parks the first seat until the second one joins.
    ///
    /// The socket is still watched so a player who leaves early abandons the
    /// session. A line that arrives meanwhile is held and returned as the
    /// first move.
    async fn await_opponent(&mut self) -> Result<Option<ClientLine>, Exit> {
        let session = Arc::clone(&self.session);
        let mut pending = None;

        loop {
            tokio::select! {
                biased;
                joined = session.await_opponent() => {
                    return match joined {
                        Ok(()) => {
                            self.outbox
                                .send(ServerMessage::OpponentConnected)
                                .map_err(|_| Exit::WriteFailed)?;
                            Ok(pending)
                        }
                        Err(_) => Err(Exit::GameOver),
                    };
                }
                _ = self.outbox.closed() => return Err(Exit::WriteFailed),
                read = self.lines.next(), if pending.is_none() => {
                    pending = Some(received(read)?);
                }
            }
        }
    }

    /// Reads moves and pushes them through the turn gate until the game ends.
    async fn turn_loop(&mut self, mut pending: Option<ClientLine>) -> Exit {
        let session = Arc::clone(&self.session);

        loop {
            let line = match pending.take() {
                Some(line) => line,
                None => tokio::select! {
                    biased;
                    _ = session.finished() => return Exit::GameOver,
                    _ = self.outbox.closed() => return Exit::WriteFailed,
                    read = self.lines.next() => match received(read) {
                        Ok(line) => line,
                        Err(exit) => return exit,
                    },
                },
            };

            let cell = match line.and_then(|line| parse_move(&line)) {
                Ok(cell) => cell,
                Err(e) => {
                    log_malformed(self.addr, self.seat, &e);
                    if self.outbox.send(ServerMessage::MalformedMove).is_err() {
                        return Exit::WriteFailed;
                    }
                    continue;
                }
            };

            // Keep watching the socket while parked so a player who leaves
            // before their turn never has the move committed.
            let mut submit = pin!(session.submit(self.seat, cell));
            let submitted = loop {
                tokio::select! {
                    biased;
                    submitted = &mut submit => break submitted,
                    _ = self.outbox.closed() => return Exit::WriteFailed,
                    read = self.lines.next(), if pending.is_none() => match received(read) {
                        Ok(line) => pending = Some(line),
                        Err(exit) => return exit,
                    },
                }
            };

            match submitted {
                Ok(outcome) => {
                    log_move(self.addr, self.seat, cell, outcome);
                    if outcome.is_terminal() {
                        return Exit::GameOver;
                    }
                }
                Err(SessionError::GameOver) => return Exit::GameOver,
                Err(e) => warn!("Move from {} dropped: {}", self.addr, e),
            }
        }
    }

    /// Leaves the session and closes the connection once every queued message
    /// has been written.
    async fn close(mut self, exit: Exit) {
        match exit {
            Exit::GameOver => self.session.unbind(self.seat).await,
            Exit::Disconnected => {
                info!("Connection closed by {} ({})", self.addr, self.seat);
                self.session.abandon(self.seat).await;
            }
            Exit::ReadFailed(e) => {
                error!("Failed to read from {}: {}", self.addr, e);
                self.session.abandon(self.seat).await;
            }
            Exit::WriteFailed => {
                error!("Lost write side of {}", self.addr);
                self.session.abandon(self.seat).await;
            }
        }
        self.transition(HandlerState::GameOver);

        // Dropping the last handler-side sender lets the writer drain and stop.
        drop(self.outbox);
        if let Err(e) = self.writer.await {
            error!("Writer for {} panicked: {}", self.addr, e);
        }

        debug!(
            "{} ({}): {} -> {}",
            self.addr,
            self.seat,
            self.state,
            HandlerState::Closed
        );
        info!("Client {} disconnected", self.addr);
    }

    fn transition(&mut self, next: HandlerState) {
        if !self.state.can_transition_to(next) {
            warn!("{} ({}): unexpected transition {} -> {}", self.addr, self.seat, self.state, next);
        }
        debug!("{} ({}): {} -> {}", self.addr, self.seat, self.state, next);
        self.state = next;
    }
}

/// Maps one read from the socket to a client line, or to the reason the
/// handler has to stop.
fn received(read: Option<io::Result<ClientLine>>) -> Result<ClientLine, Exit> {
    match read {
        Some(Ok(line)) => Ok(line),
        Some(Err(e)) => Err(Exit::ReadFailed(e)),
        None => Err(Exit::Disconnected),
    }
}

/// Writes queued messages until every sender is gone, then shuts the socket's
/// write side. A failed write ends the task, which the handler sees as its
/// outbox closing.
async fn write_messages(
    mut writer: OwnedWriteHalf,
    mut queued: mpsc::UnboundedReceiver<ServerMessage>,
    addr: SocketAddr,
) {
    while let Some(message) = queued.recv().await {
        if let Err(e) = writer.write_all(message.encode().as_bytes()).await {
            error!("Failed to write to {}: {}", addr, e);
            return;
        }
    }

    if let Err(e) = writer.shutdown().await {
        debug!("Shutdown of {} failed: {}", addr, e);
    }
}
