//! Unified error type for the Sketchroom server.

use sketchroom_game::GameError;
use sketchroom_protocol::ProtocolError;
use sketchroom_room::RoomError;
use sketchroom_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum SketchroomError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, bad room code).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (exists, not found, full).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A game-level error (for example an empty word list).
    #[error(transparent)]
    Game(#[from] GameError),
}
