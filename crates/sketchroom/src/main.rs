use std::time::Duration;

use clap::Parser;
use sketchroom::prelude::*;

/// Room-based drawing and guessing game server.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "SKETCHROOM_BIND", default_value = DEFAULT_BIND)]
    bind: String,

    /// Rounds per game
    #[arg(long, env = "SKETCHROOM_ROUNDS")]
    rounds: Option<u32>,

    /// Seconds per round once a word is chosen
    #[arg(long, env = "SKETCHROOM_ROUND_SECS")]
    round_secs: Option<u64>,

    /// Players per room
    #[arg(long, env = "SKETCHROOM_MAX_PLAYERS")]
    max_players: Option<usize>,

    /// Seconds a connection may go without sending any frame or pong
    #[arg(long, env = "SKETCHROOM_IDLE_SECS", default_value_t = DEFAULT_IDLE_TIMEOUT.as_secs())]
    idle_secs: u64,

    /// Seconds between keepalive pings
    #[arg(long, env = "SKETCHROOM_PING_SECS", default_value_t = DEFAULT_PING_INTERVAL.as_secs())]
    ping_secs: u64,
}

impl Args {
    fn game_config(&self) -> GameConfig {
        let mut config = GameConfig::default();
        if let Some(rounds) = self.rounds {
            config.max_rounds = rounds;
        }
        if let Some(secs) = self.round_secs {
            config.round_duration = Duration::from_secs(secs);
        }
        if let Some(max) = self.max_players {
            config.max_players = max;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<(), SketchroomError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let server = SketchroomServer::builder()
        .bind(&args.bind)
        .game_config(args.game_config())
        .idle_timeout(Duration::from_secs(args.idle_secs))
        .ping_interval(Duration::from_secs(args.ping_secs))
        .build()
        .await?;

    match server.local_addr() {
        Ok(addr) => tracing::info!(%addr, "listening"),
        Err(e) => tracing::warn!(error = %e, "could not read local address"),
    }

    tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received Ctrl+C, shutting down");
            Ok(())
        }
    }
}
