//! Game core for Sketchroom.
//!
//! Everything here is synchronous and free of I/O, so the rules can be
//! tested without a network or a real clock.
//!
//! # Key types
//!
//! - [`RoundMachine`]: one room's players, rounds, guesses and timers
//! - [`Effect`]: what the machine asks its owner to do
//! - [`GameConfig`]: rules and delays
//! - [`WordBank`]: the candidate words
//!
//! Scoring, hint masking and the leaderboard are plain functions in
//! [`scoring`]; guess classification lives in [`guess`].

mod config;
mod error;
pub mod guess;
mod round;
pub mod scoring;
mod words;

pub use config::GameConfig;
pub use error::GameError;
pub use round::{
    DEFAULT_NAME, Effect, Phase, Player, RoundMachine, TimerKind, WAITING_HINT, display_name,
};
pub use scoring::{hint_for, leaderboard, points_for};
pub use words::{DEFAULT_WORDS, WordBank};
