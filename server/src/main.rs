use clap::error::ErrorKind;
use clap::Parser;
use log::{error, info};
use server::config::{ServerConfig, DEFAULT_CHECK_INTERVAL};
use server::network::Server;
use shared::{DEFAULT_PORT, MIN_GRID_SIZE};
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Territory capture game server", long_about = None)]
struct Args {
    /// Side length of the square grid
    #[arg(value_parser = clap::value_parser!(u32).range(MIN_GRID_SIZE as i64..))]
    grid_size: u32,

    /// Port to listen on
    #[arg(default_value_t = DEFAULT_PORT, value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,

    /// Address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Maximum number of concurrent players (defaults to the grid size)
    #[arg(short, long)]
    max_players: Option<usize>,

    /// Milliseconds between two win checks
    #[arg(short, long, default_value_t = DEFAULT_CHECK_INTERVAL.as_millis() as u64)]
    check_interval_ms: u64,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        let mut config = ServerConfig::new(self.grid_size as usize);
        config.host = self.host;
        config.port = self.port;
        if let Some(max_players) = self.max_players {
            config.max_players = max_players;
        }
        config.check_interval = Duration::from_millis(self.check_interval_ms);
        config
    }
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
    info!("Starting server on {}", config.address());

    let server = match Server::bind(config).await {
        Ok(server) => server,
        Err(e) => {
            error!("{}", e);
            eprintln!("server: {}", e);
            return ExitCode::from(e.exit_code());
        }
    };

    if let Err(e) = server.run().await {
        error!("Server stopped: {}", e);
        return ExitCode::from(e.exit_code());
    }

    ExitCode::SUCCESS
}
