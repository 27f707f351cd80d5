//! Room lifecycle management for Sketchroom.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns one
//! [`sketchroom_game::RoundMachine`] and the room's single timer.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: creates rooms by code, routes players, forgets
//!   closed rooms
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`PlayerAction`]: what a seated player can ask of their room
//! - [`RoomError`]: why a room request failed

mod error;
mod registry;
mod room;

pub use error::RoomError;
pub use registry::RoomRegistry;
pub use room::{PlayerAction, PlayerSender, RoomHandle, RoomInfo, spawn_room};
