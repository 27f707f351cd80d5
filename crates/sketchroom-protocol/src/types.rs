//! Identifiers and the events that travel between clients and the server.
//!
//! Every event on the wire is a JSON object of the form
//! `{"event": "<name>", "data": {...}}`. Names and field names are
//! camelCase so browser clients can use them as-is; unit events carry no
//! `data` key.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sketchroom_transport::ConnectionId;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identifies one player for the lifetime of their connection.
///
/// Serialized as a plain number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

impl From<ConnectionId> for PlayerId {
    fn from(id: ConnectionId) -> Self {
        Self(id.into_inner())
    }
}

/// A normalized room code.
///
/// Codes are compared case-insensitively, so the stored form is always
/// upper-case. Construct one with [`RoomCode::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Longest accepted code, in characters.
    pub const MAX_LEN: usize = 16;

    /// Trims, upper-cases and validates a client-supplied code.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidRoomCode`] for an empty code, one
    /// longer than [`Self::MAX_LEN`], or one containing anything other
    /// than ASCII letters, digits, `-` and `_`.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let code = raw.trim().to_ascii_uppercase();
        if code.is_empty() {
            return Err(ProtocolError::InvalidRoomCode("empty".into()));
        }
        if code.chars().count() > Self::MAX_LEN {
            return Err(ProtocolError::InvalidRoomCode(format!(
                "longer than {} characters",
                Self::MAX_LEN
            )));
        }
        if !code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ProtocolError::InvalidRoomCode(format!(
                "{code:?} contains characters other than letters, digits, - and _"
            )));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RoomCode {
    type Error = ProtocolError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Who inside a room should receive an outbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every player in the room.
    All,
    /// One player only (private notifications).
    Player(PlayerId),
    /// Everyone except one player (relays back to the other members).
    AllExcept(PlayerId),
}

// ---------------------------------------------------------------------------
// Payload structs
// ---------------------------------------------------------------------------

/// Public view of a player, as listed in `roomJoined` and `updatePlayers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub name: String,
    pub score: u32,
}

/// One row of the final ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// 1-based position.
    pub rank: u32,
    pub name: String,
    pub score: u32,
}

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// Everything a client can ask of the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    /// Open a new room under `code` and join it.
    CreateRoom {
        code: String,
        #[serde(default)]
        name: String,
    },
    /// Join an existing room.
    JoinRoom {
        code: String,
        #[serde(default)]
        name: String,
    },
    /// The drawer picks one of the offered words.
    ChooseWord { word: String },
    /// A stroke from the drawer's canvas. Relayed verbatim, never parsed.
    Draw { stroke: Value },
    /// The drawer wiped the canvas.
    ClearCanvas,
    /// A chat line, which doubles as a guess while a word is active.
    ChatMessage { text: String },
    /// Keep-alive.
    Ping,
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// Everything the server can tell a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// First event on every connection: the client's own identifier.
    Welcome { player_id: PlayerId },
    /// Private: the join succeeded.
    RoomJoined { code: RoomCode, players: Vec<PlayerInfo> },
    /// Private: a room request failed (e.g. the code is taken).
    RoomError { message: String },
    /// Private: no live room has this code.
    InvalidCode { code: String },
    /// Private: the room is at capacity.
    RoomFull { code: String },
    UpdatePlayers { players: Vec<PlayerInfo> },
    NewRound {
        round: u32,
        drawer_id: PlayerId,
        drawer_name: String,
    },
    /// Private to the drawer: the candidate words.
    YourTurn { choices: Vec<String> },
    WordHint { hint: String },
    /// Private to the drawer: the word they picked is now active.
    WordChosen { word: String },
    /// Private to the drawer: the choice timed out and this word was picked.
    AutoChooseWord { word: String },
    Timer { seconds_remaining: u32 },
    Draw { stroke: Value },
    ClearCanvas,
    /// A chat line, from a player or from `"System"`.
    Message { user: String, text: String },
    /// Public: someone guessed the word. Never carries the word itself.
    CorrectGuess { name: String, points: u32 },
    /// Public: the round's word, only once the round is over.
    WordReveal { word: String },
    GameOver { leaderboard: Vec<LeaderboardEntry> },
    /// Private: the last inbound event could not be understood.
    Error { message: String },
    Pong,
}

impl ServerEvent {
    /// Name of the user that system chat lines are attributed to.
    pub const SYSTEM_USER: &'static str = "System";

    /// A chat line attributed to the server.
    pub fn system(text: impl Into<String>) -> Self {
        Self::Message {
            user: Self::SYSTEM_USER.to_string(),
            text: text.into(),
        }
    }
}
