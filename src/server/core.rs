use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::client::PlayerHandler;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::middleware::logging::log_session_end;
use crate::protocol::ServerMessage;
use crate::session::{Seat, Session, SessionId};

type SessionRegistry = Arc<Mutex<HashMap<SessionId, Arc<Session>>>>;

/// A session whose first seat is connected and waiting for an opponent.
struct PendingSession {
    session: Arc<Session>,
    first: JoinHandle<()>,
}

pub struct Server {
    listener: TcpListener,
    sessions: SessionRegistry,
    config: Arc<ServerConfig>,
}

impl Server {
    /// Binds the listening socket. Failing to bind is fatal for the caller.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let addr = config.listen_socket();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        info!("Server bound to {}", listener.local_addr()?);

        Ok(Self {
            listener,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            config: Arc::new(config),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Number of sessions currently running or waiting for an opponent.
    pub async fn active_sessions(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Accepts players forever, pairing consecutive connections into sessions.
    ///
    /// The first connection of a pair takes the first seat (X) and waits; the
    /// second takes the other seat and starts the game.
    pub async fn start(&self) {
        info!(
            "Starting tic-tac-toe server on {} (max {} sessions)",
            self.config.listen_socket(),
            self.config.max_sessions
        );

        let mut next_id: SessionId = 1;
        let mut pending: Option<PendingSession> = None;

        loop {
            let (stream, addr) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    continue;
                }
            };

            let stream = match pending.take() {
                Some(waiting) => match self.complete_session(waiting, stream, addr).await {
                    Ok(()) => continue,
                    Err((waiting, stream)) => {
                        info!(
                            "Session {} closed before an opponent arrived",
                            waiting.session.id()
                        );
                        self.retire(waiting).await;
                        stream
                    }
                },
                None => stream,
            };

            if let Some(opened) = self.open_session(next_id, stream, addr).await {
                next_id += 1;
                pending = Some(opened);
            }
        }
    }

    /// Creates a session and seats `stream` as its first player.
    async fn open_session(
        &self,
        id: SessionId,
        mut stream: TcpStream,
        addr: SocketAddr,
    ) -> Option<PendingSession> {
        let mut sessions = self.sessions.lock().await;
        if sessions.len() >= self.config.max_sessions {
            drop(sessions);
            warn!(
                "Rejecting {}: {} sessions already running",
                addr, self.config.max_sessions
            );
            let message = ServerMessage::ServerFull.encode();
            if let Err(e) = stream.write_all(message.as_bytes()).await {
                warn!("Failed to notify {}: {}", addr, e);
            }
            return None;
        }

        let session = Arc::new(Session::new(id));
        sessions.insert(id, Arc::clone(&session));
        drop(sessions);

        let joined =
            PlayerHandler::join(stream, addr, Seat::First, Arc::clone(&session), &self.config)
                .await;
        let handler = match joined {
            Ok(handler) => handler,
            Err(_) => {
                error!("Session {}: fresh session refused its first seat", id);
                self.sessions.lock().await.remove(&id);
                return None;
            }
        };
        debug!("Session {}: {} seated", id, handler.seat());
        let first = tokio::spawn(handler.run());

        Some(PendingSession { session, first })
    }

    /// Seats `stream` as the second player and releases the first seat.
    ///
    /// If the first seat has already left, the pending session and the stream
    /// are handed back untouched.
    async fn complete_session(
        &self,
        waiting: PendingSession,
        stream: TcpStream,
        addr: SocketAddr,
    ) -> Result<(), (PendingSession, TcpStream)> {
        let session = Arc::clone(&waiting.session);
        let handler =
            match PlayerHandler::join(stream, addr, Seat::Second, session, &self.config).await {
                Ok(handler) => handler,
                Err(stream) => return Err((waiting, stream)),
            };

        let PendingSession { session, first } = waiting;
        debug!("Session {}: {} seated", session.id(), handler.seat());
        let second = tokio::spawn(handler.run());

        session.opponent_joined().await;
        self.supervise(session, vec![first, second]);
        Ok(())
    }

    /// Frees the slot of a session that ended before its second seat was
    /// filled. The slot is released before the next session is opened.
    async fn retire(&self, waiting: PendingSession) {
        self.sessions.lock().await.remove(&waiting.session.id());
        self.supervise(waiting.session, vec![waiting.first]);
    }

    /// Drops the session from the registry once all of its handlers are done.
    fn supervise(&self, session: Arc<Session>, handlers: Vec<JoinHandle<()>>) {
        let sessions = Arc::clone(&self.sessions);
        tokio::spawn(async move {
            for handler in handlers {
                if let Err(e) = handler.await {
                    error!("Handler in session {} panicked: {}", session.id(), e);
                }
            }
            log_session_end(session.id(), session.end().await);
            sessions.lock().await.remove(&session.id());
        });
    }
}
