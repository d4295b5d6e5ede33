//! Per-connection protocol state machine
//!
//! Every accepted connection runs one [`Session`] on its own task. Sessions
//! never talk to each other; they only touch the shared grid, admission gate
//! and outcome slot bundled in [`SharedState`].

use crate::client_manager::{AdmissionGate, GateSlot, JoinOutcome};
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::game::{ClaimOutcome, GridStore};
use crate::outcome::OutcomeSlot;
use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use shared::{Command, Reply, MAX_LINE_LENGTH};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Framed, LinesCodec};

/// State shared by every session and the outcome watcher
#[derive(Debug, Clone)]
pub struct SharedState {
    /// Cells being claimed
    pub grid: Arc<GridStore>,
    /// Player cap and start quorum
    pub gate: Arc<AdmissionGate>,
    /// Winner, once the watcher has published one
    pub outcome: Arc<OutcomeSlot>,
}

impl SharedState {
    /// Allocates the grid, gate and outcome slot described by `config`
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            grid: Arc::new(GridStore::new(config.grid_size)),
            gate: Arc::new(AdmissionGate::new(config.max_players, config.quorum())),
            outcome: Arc::new(OutcomeSlot::new()),
        }
    }
}

/// Protocol stage of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStage {
    /// Waiting for `HELLO`
    Joining,
    /// Admitted, waiting for enough players to start
    AwaitingQuorum,
    /// `START` sent, commands are dispatched
    Active,
    /// Session finished and its slot released
    Done,
}

/// Local bookkeeping of one connection
#[derive(Debug)]
pub struct ClientSession {
    /// Last name this connection claimed a cell with
    pub player_name: Option<String>,
    /// Furthest stage the connection has reached
    pub stage: SessionStage,
}

impl ClientSession {
    pub fn new() -> Self {
        Self {
            player_name: None,
            stage: SessionStage::Joining,
        }
    }
}

impl Default for ClientSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Connection handler for one client
///
/// Generic over the stream so tests can drive it through in-memory pipes.
pub struct Session<S> {
    framed: Framed<S, LinesCodec>,
    state: SharedState,
    session: ClientSession,
    peer: String,
    // Held from admission until the session is dropped
    slot: Option<GateSlot>,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps `stream` in a line codec capped at `MAX_LINE_LENGTH`
    ///
    /// `peer` only labels log lines.
    pub fn new(stream: S, state: SharedState, peer: impl Into<String>) -> Self {
        Self {
            framed: Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LENGTH)),
            state,
            session: ClientSession::new(),
            peer: peer.into(),
            slot: None,
        }
    }

    /// Drives the connection until it closes or the game ends
    ///
    /// The admission slot, if any, is released when the session is dropped
    /// at the end of this call.
    pub async fn run(mut self) -> Result<SessionStage, ServerError> {
        let result = self.drive().await;
        let reached = self.session.stage;
        self.session.stage = SessionStage::Done;
        if self.slot.take().is_some() {
            debug!("{} released its slot", self.peer);
        }
        result.map(|_| reached)
    }

    async fn drive(&mut self) -> Result<(), ServerError> {
        let first = match self.framed.next().await {
            Some(line) => line?,
            None => return Ok(()),
        };

        if !matches!(first.parse::<Command>(), Ok(Command::Hello)) {
            warn!("{} opened with '{}', closing", self.peer, first);
            return Ok(());
        }

        match self.state.gate.try_join() {
            JoinOutcome::Rejected => {
                info!("{} rejected, server full", self.peer);
                self.send(Reply::Nack).await?;
                return Ok(());
            }
            JoinOutcome::Admitted(slot) => self.slot = Some(slot),
        }

        self.send(Reply::Size(self.state.grid.size())).await?;
        self.session.stage = SessionStage::AwaitingQuorum;

        if !self.await_quorum().await? {
            info!("{} left before the game started", self.peer);
            return Ok(());
        }

        self.send(Reply::Start).await?;
        self.session.stage = SessionStage::Active;
        debug!("{} is playing", self.peer);

        while let Some(line) = self.framed.next().await {
            let line = line?;

            if let Some(winner) = self.state.outcome.winner() {
                let winner = winner.to_string();
                self.send(Reply::End(winner)).await?;
                return Ok(());
            }

            let reply = self.dispatch(&line).await;
            self.send(reply).await?;
        }

        info!(
            "{} ({}) disconnected",
            self.peer,
            self.session.player_name.as_deref().unwrap_or("no claims")
        );
        Ok(())
    }

    /// Returns false if the client hung up before quorum was reached
    async fn await_quorum(&mut self) -> Result<bool, ServerError> {
        let gate = Arc::clone(&self.state.gate);
        loop {
            tokio::select! {
                _ = gate.wait_for_quorum() => return Ok(true),
                line = self.framed.next() => match line {
                    Some(Ok(line)) => warn!("{} sent '{}' before start, ignored", self.peer, line),
                    Some(Err(e)) => return Err(e.into()),
                    None => return Ok(false),
                },
            }
        }
    }

    async fn dispatch(&mut self, line: &str) -> Reply {
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                warn!("{} sent bad command '{}': {}", self.peer, line, e);
                return Reply::Error(e.to_string());
            }
        };
        debug!("{} -> {}", self.peer, command);

        match command {
            Command::Take { x, y, name } => match self.state.grid.try_claim(x, y, &name) {
                Ok(ClaimOutcome::Claimed) => {
                    self.session.player_name = Some(name);
                    Reply::Taken
                }
                Ok(ClaimOutcome::InUse) => Reply::InUse,
                Err(e) => Reply::Error(e.to_string()),
            },
            Command::Status { x, y } => match self.state.grid.read_status(x, y).await {
                Ok(owner) => Reply::Owner(owner),
                Err(e) => Reply::Error(e.to_string()),
            },
            Command::Hello => Reply::Error("already joined".to_string()),
        }
    }

    async fn send(&mut self, reply: Reply) -> Result<(), ServerError> {
        debug!("{} <- {}", self.peer, reply);
        self.framed.send(reply.to_string()).await?;
        Ok(())
    }
}
