//! Server network layer: listener, accept loop and task supervision

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::outcome::OutcomeWatcher;
use crate::session::{Session, SessionStage, SharedState};
use log::{debug, error, info, warn};
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::{lookup_host, TcpListener, TcpStream};
use tokio::task::{JoinError, JoinHandle, JoinSet};

/// Main server owning the listener and every worker task
pub struct Server {
    listener: TcpListener,
    config: ServerConfig,
    state: SharedState,
}

impl Server {
    /// Resolves the configured address and binds the first address that accepts
    ///
    /// Resolution failures and bind failures are reported separately so the
    /// binary can map them to distinct exit codes.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        config.validate()?;

        let address = config.address();
        let candidates: Vec<SocketAddr> = lookup_host(&address)
            .await
            .map_err(|source| ServerError::Resolve {
                address: address.clone(),
                source,
            })?
            .collect();

        let mut listener = None;
        for addr in candidates {
            match TcpListener::bind(addr).await {
                Ok(bound) => {
                    listener = Some(bound);
                    break;
                }
                Err(e) => warn!("Failed to bind {}: {}", addr, e),
            }
        }
        let listener = listener.ok_or_else(|| ServerError::Bind(address.clone()))?;

        info!(
            "Server listening on {} ({}x{} grid, {} to start, {} max)",
            listener.local_addr()?,
            config.grid_size,
            config.grid_size,
            config.quorum(),
            config.max_players
        );

        let state = SharedState::new(&config);
        Ok(Server {
            listener,
            config,
            state,
        })
    }

    /// Address the listener actually bound, useful with port 0
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Grid, gate and outcome shared with every session
    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Spawns the task that publishes the winner once the grid is owned by one name
    fn spawn_outcome_watcher(&self) -> JoinHandle<String> {
        let watcher = OutcomeWatcher::new(
            self.state.grid.clone(),
            self.state.outcome.clone(),
            self.config.check_interval,
        );
        tokio::spawn(watcher.run())
    }

    fn spawn_session(&self, sessions: &mut JoinSet<()>, stream: TcpStream, addr: SocketAddr) {
        let session = Session::new(stream, self.state.clone(), addr.to_string());
        sessions.spawn(async move {
            match session.run().await {
                Ok(SessionStage::Active) => debug!("Session {} finished", addr),
                Ok(stage) => debug!("Session {} ended during {:?}", addr, stage),
                Err(e) => warn!("Session {} abandoned: {}", addr, e),
            }
        });
    }

    fn reap(result: Result<(), JoinError>) {
        if let Err(e) = result {
            if e.is_panic() {
                error!("Session task panicked: {}", e);
            }
        }
    }

    /// Accepts connections until `shutdown` resolves
    ///
    /// Finished session tasks are joined as they complete. On shutdown the
    /// remaining sessions and the watcher are aborted, which releases every
    /// cell lock and player slot they hold.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        let mut watcher = self.spawn_outcome_watcher();
        let mut watcher_done = false;
        let mut sessions = JoinSet::new();
        tokio::pin!(shutdown);

        info!("Server started successfully");

        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        debug!("Accepted connection from {}", addr);
                        self.spawn_session(&mut sessions, stream, addr);
                    }
                    Err(e) => error!("Error accepting connection: {}", e),
                },

                Some(result) = sessions.join_next(), if !sessions.is_empty() => {
                    Self::reap(result);
                },

                result = &mut watcher, if !watcher_done => {
                    watcher_done = true;
                    match result {
                        Ok(winner) => info!("Winner is {}", winner),
                        Err(e) => error!("Outcome watcher failed: {}", e),
                    }
                },

                _ = &mut shutdown => {
                    info!("Server shutting down");
                    break;
                }
            }
        }

        watcher.abort();
        sessions.shutdown().await;
        Ok(())
    }

    /// Runs until Ctrl+C
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }
}
