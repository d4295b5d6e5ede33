use clap::error::ErrorKind;
use clap::Parser;
use client::config::{ClientConfig, DEFAULT_ATTEMPTS, DEFAULT_DELAY};
use client::game::{GameOutcome, GameSummary};
use client::network::{connect, Client};
use log::{error, info};
use shared::DEFAULT_PORT;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Scripted player for the territory capture game", long_about = None)]
struct Args {
    /// Name written into claimed cells
    player_name: String,

    /// Server port to connect to
    #[arg(default_value_t = DEFAULT_PORT, value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,

    /// Server host
    #[arg(short = 'H', long, default_value = "localhost")]
    host: String,

    /// Commands to send before giving up
    #[arg(short, long, default_value_t = DEFAULT_ATTEMPTS)]
    attempts: usize,

    /// Milliseconds to wait between commands
    #[arg(short, long, default_value_t = DEFAULT_DELAY.as_millis() as u64)]
    delay_ms: u64,

    /// Seed for a reproducible move sequence
    #[arg(short, long)]
    seed: Option<u64>,
}

impl Args {
    fn into_config(self) -> ClientConfig {
        let mut config = ClientConfig::new(self.player_name);
        config.host = self.host;
        config.port = self.port;
        config.attempts = self.attempts;
        config.delay = Duration::from_millis(self.delay_ms);
        config.seed = self.seed;
        config
    }
}

fn print_summary(name: &str, summary: &GameSummary) {
    match &summary.outcome {
        GameOutcome::Rejected => println!("client: server full, {} was not admitted", name),
        GameOutcome::Ended { winner } if winner == name => println!("client: {} won!", name),
        GameOutcome::Ended { winner } => println!("client: game over, {} won", winner),
        GameOutcome::OutOfMoves => println!("client: no winner yet, out of moves"),
    }
    println!(
        "client: {} claims, {} in use, {} errors, holding {} cells",
        summary.claims, summary.contentions, summary.errors, summary.owned
    );
}

/// Exit code for a command line that could not be parsed
///
/// Help and version output succeed. Usage errors count as setup errors so
/// that exit code 2 stays reserved for network failures.
fn usage_exit_code(err: &clap::Error) -> u8 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(usage_exit_code(&e));
        }
    };
    let config = args.into_config();
    let name = config.player_name.clone();
    info!("Starting client {}", name);
    info!("Connecting to: {}", config.address());

    let result = match connect(&config).await {
        Ok(stream) => Client::new(stream, config).run().await,
        Err(e) => Err(e),
    };

    match result {
        Ok(summary) => {
            print_summary(&name, &summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("client: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("client").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["alice"]).unwrap().into_config();
        assert_eq!(config.player_name, "alice");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.host, "localhost");
        assert_eq!(config.attempts, DEFAULT_ATTEMPTS);
        assert_eq!(config.delay, DEFAULT_DELAY);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_usage_errors_exit_with_one() {
        let cases: [&[&str]; 4] = [&[], &["alice", "0"], &["alice", "70000"], &["alice", "-a", "many"]];
        for args in cases {
            let err = parse(args).unwrap_err();
            assert_eq!(usage_exit_code(&err), 1, "args {:?}", args);
        }
    }

    #[test]
    fn test_help_and_version_exit_with_zero() {
        assert_eq!(usage_exit_code(&parse(&["--help"]).unwrap_err()), 0);
        assert_eq!(usage_exit_code(&parse(&["--version"]).unwrap_err()), 0);
    }
}
