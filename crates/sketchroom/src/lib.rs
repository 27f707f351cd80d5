//! # Sketchroom
//!
//! A real-time, room-based drawing and guessing game server.
//!
//! Players open or join a room by code. Each round one player draws a
//! secret word while the others race to guess it in chat; faster guesses
//! earn more points. After a fixed number of rounds the room reports a
//! leaderboard and closes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sketchroom::prelude::*;
//!
//! # async fn run() -> Result<(), SketchroomError> {
//! let server = SketchroomServer::builder()
//!     .bind("0.0.0.0:3000")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::SketchroomError;
pub use server::{
    DEFAULT_BIND, DEFAULT_IDLE_TIMEOUT, DEFAULT_PING_INTERVAL, SketchroomServer,
    SketchroomServerBuilder,
};

/// Re-exports of everything needed to configure and run a server.
pub mod prelude {
    pub use crate::{
        DEFAULT_BIND, DEFAULT_IDLE_TIMEOUT, DEFAULT_PING_INTERVAL, SketchroomError,
        SketchroomServer, SketchroomServerBuilder,
    };
    pub use sketchroom_game::{GameConfig, WordBank};
    pub use sketchroom_protocol::{ClientEvent, PlayerId, RoomCode, ServerEvent};
}
