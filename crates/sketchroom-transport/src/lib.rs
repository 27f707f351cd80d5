//! Transport layer for Sketchroom.
//!
//! The game only needs a handful of things from the network: accept a
//! client, give it a stable identifier, push text frames to it, keep it
//! alive with pings, and learn when it goes away. [`Transport`] and
//! [`Connection`] are that contract. Room fan-out (one, all, all-but-one)
//! is built from per-connection sends in the room layer, not here.

#![allow(async_fn_in_trait)]

mod error;
mod websocket;

pub use error::TransportError;
pub use websocket::{HANDSHAKE_TIMEOUT, WebSocketConnection, WebSocketTransport};

use std::fmt;
use std::net::SocketAddr;

/// Identifier of one client connection, unique for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// One inbound frame, as seen by the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A text frame carrying an event.
    Text(String),
    /// Any other frame: ping, pong, or a binary payload that is not UTF-8.
    /// Carries no event but shows the peer is still there.
    Control,
}

/// A listener producing client connections.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    /// Waits for the next client and completes its handshake.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// One client connection exchanging UTF-8 text frames.
///
/// `send` and `recv` may run at the same time from different tasks: the
/// writer task drains the player's outbound queue while the reader waits
/// for the next inbound event.
pub trait Connection: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync;

    /// Sends one text frame.
    async fn send(&self, text: &str) -> Result<(), Self::Error>;

    /// Receives the next frame.
    ///
    /// Returns `Ok(None)` once the peer has closed the connection.
    async fn recv(&self) -> Result<Option<Inbound>, Self::Error>;

    /// Sends a keepalive ping. The peer's pong arrives as
    /// [`Inbound::Control`].
    async fn ping(&self) -> Result<(), Self::Error>;

    /// Starts the closing handshake.
    async fn close(&self) -> Result<(), Self::Error>;

    fn id(&self) -> ConnectionId;

    fn peer_addr(&self) -> SocketAddr;
}
