//! Error types for the room layer.

use sketchroom_game::GameError;
use sketchroom_protocol::{PlayerId, RoomCode};

/// Errors that can occur during room operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// A live room already uses this code.
    #[error("room {0} already exists")]
    RoomExists(RoomCode),

    /// No live room uses this code.
    #[error("room {0} not found")]
    NoSuchRoom(RoomCode),

    /// The room is at capacity.
    #[error("room {0} is full")]
    RoomFull(RoomCode),

    /// The player is already seated in a live room.
    #[error("player {0} already in room {1}")]
    AlreadyInRoom(PlayerId, RoomCode),

    /// The player is not seated anywhere.
    #[error("player {0} is not in any room")]
    NotInRoom(PlayerId),

    /// The room's actor has stopped or its channel is gone.
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),
}

impl RoomError {
    /// Lifts a game-layer rejection into the room it happened in.
    pub(crate) fn from_game(code: &RoomCode, err: GameError) -> Self {
        match err {
            GameError::RoomFull => Self::RoomFull(code.clone()),
            GameError::AlreadyJoined(player) => Self::AlreadyInRoom(player, code.clone()),
            GameError::EmptyWordBank => Self::Unavailable(code.clone()),
        }
    }
}
