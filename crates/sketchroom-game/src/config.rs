//! Game configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Every tunable of a room's game.
///
/// The defaults are the classic rules: up to 10 players, 6 rounds of
/// 80 seconds, 3 word choices with a 15 second grace period, and
/// 100 down to 20 points per correct guess.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Room capacity.
    pub max_players: usize,

    /// Players needed before the first round starts.
    pub min_players: usize,

    /// Rounds per game. The game ends once this many rounds were started.
    pub max_rounds: u32,

    /// Countdown length once a word is active.
    pub round_duration: Duration,

    /// Candidate words offered to the drawer.
    pub word_choices: usize,

    /// How long the drawer may take to pick before the first candidate
    /// is chosen for them.
    pub choice_timeout: Duration,

    /// Pause between reaching `min_players` and the first round.
    pub start_delay: Duration,

    /// Pause between the last correct guess and the word reveal.
    pub early_reveal_delay: Duration,

    /// Pause between a timed-out reveal and the next round.
    pub intermission_after_timeout: Duration,

    /// Pause between an everyone-guessed reveal and the next round.
    pub intermission_after_all_guessed: Duration,

    /// Pause before the next round when the drawer leaves mid-round.
    pub drawer_left_delay: Duration,

    /// Points for a guess at zero elapsed seconds.
    pub max_points: u32,

    /// Floor for late guesses.
    pub min_points: u32,

    /// Shortest partial guess that counts as "too close".
    pub near_miss_min_len: usize,

    /// Display names are truncated to this many characters.
    pub max_name_len: usize,

    /// Chat lines are truncated to this many characters.
    pub max_message_len: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_players: 10,
            min_players: 2,
            max_rounds: 6,
            round_duration: Duration::from_secs(80),
            word_choices: 3,
            choice_timeout: Duration::from_secs(15),
            start_delay: Duration::from_secs(3),
            early_reveal_delay: Duration::from_secs(2),
            intermission_after_timeout: Duration::from_secs(5),
            intermission_after_all_guessed: Duration::from_secs(4),
            drawer_left_delay: Duration::from_secs(3),
            max_points: 100,
            min_points: 20,
            near_miss_min_len: 3,
            max_name_len: 20,
            max_message_len: 200,
        }
    }
}

impl GameConfig {
    /// Fix any out-of-range values so the config is safe to run with.
    ///
    /// Rules:
    /// - `min_players` at least 2, `max_players` at least `min_players`.
    /// - `max_rounds` and `word_choices` at least 1.
    /// - `round_duration` at least one second, whole seconds only.
    /// - `min_points` no greater than `max_points`.
    pub fn validated(mut self) -> Self {
        if self.min_players < 2 {
            warn!(min_players = self.min_players, "min_players below 2, clamping");
            self.min_players = 2;
        }
        if self.max_players < self.min_players {
            warn!(
                max_players = self.max_players,
                min_players = self.min_players,
                "max_players below min_players, clamping"
            );
            self.max_players = self.min_players;
        }
        if self.max_rounds == 0 {
            warn!("max_rounds is 0, clamping to 1");
            self.max_rounds = 1;
        }
        if self.word_choices == 0 {
            warn!("word_choices is 0, clamping to 1");
            self.word_choices = 1;
        }
        let secs = self.round_duration.as_secs().max(1);
        if Duration::from_secs(secs) != self.round_duration {
            warn!(
                round_duration_ms = self.round_duration.as_millis() as u64,
                "round_duration must be whole seconds, rounding"
            );
            self.round_duration = Duration::from_secs(secs);
        }
        if self.min_points > self.max_points {
            warn!(
                min_points = self.min_points,
                max_points = self.max_points,
                "min_points above max_points, clamping"
            );
            self.min_points = self.max_points;
        }
        self
    }

    /// Countdown length in whole seconds.
    pub fn round_secs(&self) -> u32 {
        u32::try_from(self.round_duration.as_secs()).unwrap_or(u32::MAX)
    }
}
