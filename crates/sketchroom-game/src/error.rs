//! Error types for the game layer.

use sketchroom_protocol::PlayerId;

/// Errors raised by the game core. All of them are local to one request;
/// none of them end a game.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// The room already holds `max_players`.
    #[error("room is full")]
    RoomFull,

    /// The connection is already seated in this room.
    #[error("player {0} already joined")]
    AlreadyJoined(PlayerId),

    /// A word bank needs at least one usable word.
    #[error("word bank is empty")]
    EmptyWordBank,
}
