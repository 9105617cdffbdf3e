//! Console server.
//!
//! Routes [`TransportEvent`]s to one worker task per connected peer. Each
//! worker owns that peer's [`Session`] and [`TransmitGate`] and handles its
//! inbox strictly in order:
//!
//! ```text
//! bytes -> tokenize -> dispatch (blocking pool) -> frame -> gate -> transport
//! ```
//!
//! All chunks of one reply are handed to the transport before the next line
//! from the same peer is tokenized. External commands run on tokio's
//! blocking pool, so a slow `scan` or `conn` only stalls its own peer.
//!
//! ## Disconnects
//!
//! A disconnect destroys the session at once: queued input is discarded and
//! the reply of a command still running is never sent. If the same peer
//! reconnects, its new worker waits for the old one to exit before it
//! handles anything, so replies from the two sessions cannot mix.
//!
//! Each inbox holds at most [`INBOX_DEPTH`] inputs. Input arriving while it
//! is full is logged and dropped.
//!
//! ## Faults
//!
//! Parse errors are ordinary: the line is logged and gets no reply. A panic
//! inside a command handler is a fault: it is logged, the transport is told
//! to close that peer, and every other connection keeps running.

use crate::config::ConsoleConfig;
use crate::console::{
    tokenize, Dispatcher, FrameError, ResponseFramer, Session, TransmitGate,
};
use crate::executor::CommandExecutor;
use crate::stats::ConsoleStats;
use crate::transport::{PeerId, Transport, TransportEvent};
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use zeroize::Zeroizing;

/// Inputs buffered per connection while a command runs.
pub const INBOX_DEPTH: usize = 16;

/// Errors from the console server.
#[derive(Debug)]
pub enum ServerError {
    /// The configured chunk size is unusable.
    Frame(FrameError),
    /// A command handler panicked or was cancelled.
    Worker(JoinError),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Frame(e) => write!(f, "framing error: {}", e),
            Self::Worker(e) => write!(f, "command handler failed: {}", e),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Frame(e) => Some(e),
            Self::Worker(e) => Some(e),
        }
    }
}

impl From<FrameError> for ServerError {
    fn from(e: FrameError) -> Self {
        Self::Frame(e)
    }
}

impl From<JoinError> for ServerError {
    fn from(e: JoinError) -> Self {
        Self::Worker(e)
    }
}

/// Work queued for one connection.
#[derive(Debug)]
enum ConnectionInput {
    Subscription(bool),
    Line(Vec<u8>),
}

/// Everything a connection worker needs, shared across workers.
struct Shared {
    dispatcher: Dispatcher,
    framer: ResponseFramer,
    executor: Arc<dyn CommandExecutor>,
    transport: Arc<dyn Transport>,
    stats: Arc<ConsoleStats>,
}

/// A running connection worker.
struct Connection {
    inbox: mpsc::Sender<ConnectionInput>,
    /// Cancelled when the peer disconnects.
    closed: CancellationToken,
    handle: JoinHandle<()>,
}

/// The console: routes transport events to per-connection workers.
pub struct ConsoleServer {
    shared: Arc<Shared>,
    connections: HashMap<PeerId, Connection>,
    /// Workers of disconnected peers that may still be winding down.
    retired: HashMap<PeerId, JoinHandle<()>>,
}

impl ConsoleServer {
    /// Create a console server.
    ///
    /// Fails if `config.chunk_size` is below the framing minimum.
    pub fn new(
        config: &ConsoleConfig,
        executor: Arc<dyn CommandExecutor>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ServerError> {
        let shared = Shared {
            dispatcher: Dispatcher::new(config),
            framer: ResponseFramer::try_new(config.chunk_size)?,
            executor,
            transport,
            stats: Arc::new(ConsoleStats::new()),
        };
        Ok(Self {
            shared: Arc::new(shared),
            connections: HashMap::new(),
            retired: HashMap::new(),
        })
    }

    /// Statistics updated by this server.
    pub fn stats(&self) -> Arc<ConsoleStats> {
        self.shared.stats.clone()
    }

    /// Process events until the channel closes or `cancel` fires.
    ///
    /// Connected peers get to drain their inboxes; workers of peers that
    /// already disconnected are awaited too, so no task outlives this call.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<TransportEvent>,
        cancel: CancellationToken,
    ) {
        info!("Console server running");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Console server cancelled");
                    break;
                }
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => {
                        info!("Transport closed");
                        break;
                    }
                },
            }
        }

        for (peer, connection) in self.connections.drain() {
            drop(connection.inbox);
            if let Err(e) = connection.handle.await {
                error!("Worker for {} ended abnormally: {}", peer, e);
            }
        }
        for (peer, handle) in self.retired.drain() {
            if let Err(e) = handle.await {
                error!("Worker for {} ended abnormally: {}", peer, e);
            }
        }
        info!("Console server stopped");
    }

    fn handle_event(&mut self, event: TransportEvent) {
        self.retired.retain(|_, handle| !handle.is_finished());

        match event {
            TransportEvent::Connected(peer) => {
                info!("Connected: {}", peer);
                self.connection(peer);
            }
            TransportEvent::Disconnected(peer) => {
                info!("Disconnected: {}", peer);
                if let Some(connection) = self.connections.remove(&peer) {
                    connection.closed.cancel();
                    self.retired.insert(peer, connection.handle);
                    self.shared.stats.record_disconnect();
                }
            }
            TransportEvent::SubscriptionChanged { peer, subscribed } => {
                debug!("{} notifications {}", peer, if subscribed { "on" } else { "off" });
                self.forward(peer, ConnectionInput::Subscription(subscribed));
            }
            TransportEvent::Write { peer, data } => {
                self.forward(peer, ConnectionInput::Line(data));
            }
        }
    }

    /// Get the worker for `peer`, starting one if needed.
    fn connection(&mut self, peer: PeerId) -> &Connection {
        let shared = &self.shared;
        let retired = &mut self.retired;
        self.connections.entry(peer).or_insert_with(|| {
            shared.stats.record_connect();
            let (inbox, rx) = mpsc::channel(INBOX_DEPTH);
            let closed = CancellationToken::new();
            let worker = Worker {
                peer,
                inbox: rx,
                closed: closed.clone(),
                previous: retired.remove(&peer),
                shared: shared.clone(),
            };
            let handle = tokio::spawn(worker.run());
            Connection {
                inbox,
                closed,
                handle,
            }
        })
    }

    fn forward(&mut self, peer: PeerId, input: ConnectionInput) {
        if !self.connections.contains_key(&peer) {
            debug!("Event from {} before connect, starting session", peer);
        }
        match self.connection(peer).inbox.try_send(input) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Inbox full for {}, dropping input", peer);
                self.shared.stats.record_input_dropped();
            }
            Err(TrySendError::Closed(_)) => {
                // Worker already exited after a fault
                warn!("Dropping input for closed session {}", peer);
                if let Some(connection) = self.connections.remove(&peer) {
                    self.retired.insert(peer, connection.handle);
                }
                self.shared.stats.record_disconnect();
            }
        }
    }
}

/// One connection's worker task.
struct Worker {
    peer: PeerId,
    inbox: mpsc::Receiver<ConnectionInput>,
    closed: CancellationToken,
    /// Worker of an earlier connection from the same peer.
    previous: Option<JoinHandle<()>>,
    shared: Arc<Shared>,
}

impl Worker {
    async fn run(mut self) {
        let peer = self.peer;
        if let Some(previous) = self.previous.take() {
            if let Err(e) = previous.await {
                error!("Previous worker for {} ended abnormally: {}", peer, e);
            }
        }

        let mut session = Session::new();
        let mut gate = TransmitGate::new();

        loop {
            let input = tokio::select! {
                biased;
                _ = self.closed.cancelled() => break,
                input = self.inbox.recv() => match input {
                    Some(input) => input,
                    None => break,
                },
            };
            match input {
                ConnectionInput::Subscription(true) => gate.subscribe(peer),
                ConnectionInput::Subscription(false) => gate.unsubscribe(),
                ConnectionInput::Line(data) => {
                    match self.handle_line(data, session, &gate).await {
                        Ok(Some(next)) => session = next,
                        Ok(None) => break,
                        Err(e) => {
                            error!("Fault in session {}: {}", peer, e);
                            self.shared.stats.record_fault();
                            self.shared.transport.close(peer);
                            return;
                        }
                    }
                }
            }
        }
        debug!("Session {} ended", peer);
    }

    /// Handle one inbound line, returning the session for the next one.
    ///
    /// Returns `None` if the peer disconnected while the command ran.
    async fn handle_line(
        &self,
        data: Vec<u8>,
        session: Session,
        gate: &TransmitGate,
    ) -> Result<Option<Session>, ServerError> {
        let peer = self.peer;
        let shared = &self.shared;
        let line = match String::from_utf8(data) {
            Ok(line) => Zeroizing::new(line),
            Err(e) => {
                info!("Ignoring non-UTF-8 input from {}: {}", peer, e.utf8_error());
                shared.stats.record_parse_error();
                return Ok(Some(session));
            }
        };

        let tokens = match tokenize(&line) {
            Ok(tokens) => Zeroizing::new(tokens),
            Err(e) => {
                info!("Ignoring unparseable line from {}: {}", peer, e);
                shared.stats.record_parse_error();
                return Ok(Some(session));
            }
        };
        if tokens.is_empty() {
            return Ok(Some(session));
        }

        let worker = shared.clone();
        let job = tokio::task::spawn_blocking(move || {
            let mut session = session;
            let reply = worker
                .dispatcher
                .dispatch(&tokens, &mut session, worker.executor.as_ref());
            (session, reply)
        });
        // The blocking call cannot be interrupted; its result is discarded
        let (session, reply) = tokio::select! {
            biased;
            _ = self.closed.cancelled() => {
                debug!("{} disconnected while a command ran, discarding reply", peer);
                return Ok(None);
            }
            joined = job => joined?,
        };

        if let Some(reply) = reply {
            debug!("Reply to {}: code {}", peer, reply.code);
            shared.stats.record_reply(reply.code);
            if self.closed.is_cancelled() {
                return Ok(None);
            }
            let chunks = shared.framer.frame(&reply);
            let outcome = gate.emit(shared.transport.as_ref(), &chunks);
            shared.stats.record_emit(&outcome);
        }

        Ok(Some(session))
    }
}
