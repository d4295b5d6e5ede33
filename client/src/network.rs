use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::game::{ClientGameState, GameOutcome, GameSummary};
use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{Command, Reply, MAX_LINE_LENGTH};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{lookup_host, TcpStream};
use tokio::time::sleep;
use tokio_util::codec::{Framed, LinesCodec};

/// Resolves the server address and connects to the first address that answers
pub async fn connect(config: &ClientConfig) -> Result<TcpStream, ClientError> {
    let address = config.address();
    let candidates = lookup_host(&address)
        .await
        .map_err(|source| ClientError::Resolve {
            address: address.clone(),
            source,
        })?;

    for addr in candidates {
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                info!("Connected to {}", addr);
                return Ok(stream);
            }
            Err(e) => warn!("Failed to connect to {}: {}", addr, e),
        }
    }

    Err(ClientError::Connect(address))
}

/// Scripted player driving the protocol over one stream
pub struct Client<S> {
    framed: Framed<S, LinesCodec>,
    game: ClientGameState,
    config: ClientConfig,
    rng: StdRng,
}

impl<S> Client<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, config: ClientConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Client {
            framed: Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LENGTH)),
            game: ClientGameState::new(config.player_name.clone(), config.status_every),
            config,
            rng,
        }
    }

    pub fn game(&self) -> &ClientGameState {
        &self.game
    }

    async fn send(&mut self, command: &Command) -> Result<(), ClientError> {
        debug!("-> {}", command);
        self.framed.send(command.to_string()).await?;
        Ok(())
    }

    async fn recv_line(&mut self) -> Result<String, ClientError> {
        match self.framed.next().await {
            Some(line) => Ok(line?),
            None => Err(ClientError::ConnectionClosed),
        }
    }

    /// Sends HELLO and waits for START
    ///
    /// Returns false if the server turned the player away.
    async fn join(&mut self) -> Result<bool, ClientError> {
        self.send(&Command::Hello).await?;

        let line = self.recv_line().await?;
        match line.parse::<Reply>() {
            Ok(Reply::Size(size)) => {
                info!("Joined a {}x{} grid, waiting for other players", size, size);
                self.game.joined(size);
            }
            Ok(Reply::Nack) => {
                info!("Server is full");
                self.game.finish();
                return Ok(false);
            }
            _ => {
                return Err(ClientError::UnexpectedReply {
                    expected: "SIZE or NACK",
                    got: line,
                })
            }
        }

        let line = self.recv_line().await?;
        match line.parse::<Reply>() {
            Ok(Reply::Start) => {
                info!("Game started");
                self.game.started();
                Ok(true)
            }
            _ => Err(ClientError::UnexpectedReply {
                expected: "START",
                got: line,
            }),
        }
    }

    /// Plays until the game ends or the attempt budget is spent
    pub async fn run(&mut self) -> Result<GameSummary, ClientError> {
        if !self.join().await? {
            return Ok(self.game.summary(GameOutcome::Rejected));
        }

        for _ in 0..self.config.attempts {
            let command = match self.game.next_move(&mut self.rng) {
                Some(command) => command,
                None => break,
            };
            self.send(&command).await?;

            let line = self.recv_line().await?;
            let reply = match command {
                Command::Status { .. } => Reply::parse_status(&line),
                _ => line.parse::<Reply>()?,
            };
            info!("{} -> {}", command, reply);
            self.game.record_reply(&command, &reply);

            if let Reply::End(winner) = reply {
                info!("Game over, winner: {}", winner);
                return Ok(self.game.summary(GameOutcome::Ended { winner }));
            }

            if !self.config.delay.is_zero() {
                sleep(self.config.delay).await;
            }
        }

        self.game.finish();
        Ok(self.game.summary(GameOutcome::OutOfMoves))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::ClientStage;
    use std::time::Duration;
    use tokio::io::{duplex, DuplexStream};
    use tokio::task::JoinHandle;

    fn test_config(attempts: usize) -> ClientConfig {
        let mut config = ClientConfig::new("alice");
        config.attempts = attempts;
        config.delay = Duration::ZERO;
        config.seed = Some(42);
        config
    }

    /// Fake server that expects HELLO, answers with `replies` and hangs up
    fn greeting_server(replies: &'static [&'static str]) -> (DuplexStream, JoinHandle<()>) {
        let (client_end, server_end) = duplex(1024);
        let handle = tokio::spawn(async move {
            let mut framed = Framed::new(server_end, LinesCodec::new());
            assert_eq!(framed.next().await.unwrap().unwrap(), "HELLO");
            for reply in replies {
                framed.send(*reply).await.unwrap();
            }
        });
        (client_end, handle)
    }

    #[tokio::test]
    async fn test_rejected_join() {
        let (stream, server) = greeting_server(&["NACK"]);
        let mut client = Client::new(stream, test_config(10));

        let summary = client.run().await.unwrap();
        assert_eq!(summary.outcome, GameOutcome::Rejected);
        assert_eq!(summary.grid_size, None);
        assert_eq!(client.game().stage(), ClientStage::Finished);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_join_without_moves() {
        let (stream, server) = greeting_server(&["SIZE 4", "START"]);
        let mut client = Client::new(stream, test_config(0));

        let summary = client.run().await.unwrap();
        assert_eq!(summary.outcome, GameOutcome::OutOfMoves);
        assert_eq!(summary.grid_size, Some(4));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_unexpected_greeting() {
        let (stream, _server) = greeting_server(&["START"]);
        let mut client = Client::new(stream, test_config(1));

        let err = client.run().await.unwrap_err();
        assert!(matches!(err, ClientError::UnexpectedReply { .. }));
    }

    #[tokio::test]
    async fn test_closed_before_start() {
        let (stream, _server) = greeting_server(&["SIZE 4"]);
        let mut client = Client::new(stream, test_config(1));

        let err = client.run().await.unwrap_err();
        assert!(matches!(err, ClientError::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_plays_until_end() {
        let (client_end, server_end) = duplex(1024);
        let server = tokio::spawn(async move {
            let mut framed = Framed::new(server_end, LinesCodec::new());
            assert_eq!(framed.next().await.unwrap().unwrap(), "HELLO");
            framed.send("SIZE 4").await.unwrap();
            framed.send("START").await.unwrap();

            let mut commands = Vec::new();
            for turn in 0..3 {
                let line = framed.next().await.unwrap().unwrap();
                commands.push(line);
                let reply = if turn < 2 { "TAKEN" } else { "END bob" };
                framed.send(reply).await.unwrap();
            }
            commands
        });

        let mut client = Client::new(client_end, test_config(10));
        let summary = client.run().await.unwrap();

        assert_eq!(
            summary.outcome,
            GameOutcome::Ended {
                winner: "bob".to_string()
            }
        );
        assert_eq!(summary.claims, 2);

        let commands = server.await.unwrap();
        assert!(commands.iter().all(|c| c.starts_with("TAKE ") && c.ends_with(" alice")));
    }
}
