//! Wire protocol for Sketchroom.
//!
//! - **Types** ([`ClientEvent`], [`ServerEvent`], [`PlayerId`],
//!   [`RoomCode`], [`Recipient`]): what travels between clients and
//!   the server, and who it is addressed to.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how events become text frames.
//! - **Errors** ([`ProtocolError`]): what can go wrong on the way.
//!
//! ```text
//! Transport (text frames) → Protocol (events) → Room (game rules)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    ClientEvent, LeaderboardEntry, PlayerId, PlayerInfo, Recipient, RoomCode,
    ServerEvent,
};
