//! `SketchroomServer` builder and server loop.
//!
//! This is the entry point for running a Sketchroom server. It ties
//! together all the layers: transport → protocol → room → game.

use std::sync::Arc;
use std::time::Duration;

use sketchroom_game::{GameConfig, WordBank};
use sketchroom_protocol::{Codec, JsonCodec};
use sketchroom_room::RoomRegistry;
use sketchroom_transport::{Transport, TransportError, WebSocketTransport};
use tokio::sync::Mutex;

use crate::SketchroomError;
use crate::handler::handle_connection;

/// Address the server listens on unless told otherwise.
pub const DEFAULT_BIND: &str = "0.0.0.0:3000";

/// A connection that sends nothing for this long, pongs included, is
/// treated as gone.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// How often the server pings each connection.
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(25);

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) rooms: Mutex<RoomRegistry>,
    pub(crate) codec: C,
    pub(crate) idle_timeout: Duration,
    pub(crate) ping_interval: Duration,
}

/// Builder for configuring and starting a Sketchroom server.
///
/// # Example
///
/// ```rust,no_run
/// use sketchroom::prelude::*;
///
/// # async fn run() -> Result<(), SketchroomError> {
/// let server = SketchroomServer::builder()
///     .bind("0.0.0.0:3000")
///     .game_config(GameConfig { max_rounds: 3, ..GameConfig::default() })
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct SketchroomServerBuilder {
    bind_addr: String,
    game_config: GameConfig,
    words: WordBank,
    idle_timeout: Duration,
    ping_interval: Duration,
}

impl SketchroomServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_BIND.to_string(),
            game_config: GameConfig::default(),
            words: WordBank::default(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            ping_interval: DEFAULT_PING_INTERVAL,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the rules every room plays by. Out-of-range values are
    /// clamped when the server is built.
    pub fn game_config(mut self, config: GameConfig) -> Self {
        self.game_config = config;
        self
    }

    /// Replaces the stock word list.
    pub fn words(mut self, words: WordBank) -> Self {
        self.words = words;
        self
    }

    /// Sets how long a connection may go without sending any frame
    /// before it is dropped.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Sets how often connections are pinged. Must be shorter than the
    /// idle timeout; otherwise half the idle timeout is used.
    pub fn ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval;
        self
    }

    /// Binds the listener and builds the server.
    pub async fn build(self) -> Result<SketchroomServer, SketchroomError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let config = self.game_config.validated();
        let mut ping_interval = self.ping_interval;
        if ping_interval.is_zero() || ping_interval >= self.idle_timeout {
            ping_interval = self.idle_timeout / 2;
            tracing::warn!(
                requested_ms = self.ping_interval.as_millis() as u64,
                idle_timeout_ms = self.idle_timeout.as_millis() as u64,
                "ping interval must be below the idle timeout, using half of it"
            );
        }

        tracing::info!(
            max_players = config.max_players,
            max_rounds = config.max_rounds,
            round_secs = config.round_secs(),
            words = self.words.len(),
            "game configured"
        );

        let state = Arc::new(ServerState {
            rooms: Mutex::new(RoomRegistry::new(config, Arc::new(self.words))),
            codec: JsonCodec,
            idle_timeout: self.idle_timeout,
            ping_interval,
        });

        Ok(SketchroomServer { transport, state })
    }
}

impl Default for SketchroomServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Sketchroom server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct SketchroomServer<C: Codec = JsonCodec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl SketchroomServer {
    /// Creates a new builder.
    pub fn builder() -> SketchroomServerBuilder {
        SketchroomServerBuilder::new()
    }
}

impl<C: Codec> SketchroomServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Spawns a handler task for each accepted connection. Runs until the
    /// process is terminated.
    pub async fn run(mut self) -> Result<(), SketchroomError> {
        tracing::info!("Sketchroom server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e @ (TransportError::Handshake { .. } | TransportError::HandshakeTimeout(_))) => {
                    tracing::debug!(error = %e, "client dropped during handshake");
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
