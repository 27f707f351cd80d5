//! Points, hints and the final ranking.

use sketchroom_protocol::{LeaderboardEntry, PlayerInfo};

use crate::GameConfig;

/// Points for a correct guess made `elapsed_secs` after the word became
/// active: one point less per second, never below the floor.
pub fn points_for(elapsed_secs: u64, config: &GameConfig) -> u32 {
    let elapsed = u32::try_from(elapsed_secs).unwrap_or(u32::MAX);
    config
        .max_points
        .saturating_sub(elapsed)
        .max(config.min_points)
}

/// Masked rendering of `word` shown to guessers.
///
/// Characters at even positions are shown, letters at odd positions
/// become `_`, anything else (spaces, hyphens) stays visible. Characters
/// are separated by single spaces.
///
/// ```
/// use sketchroom_game::hint_for;
///
/// assert_eq!(hint_for("giraffe"), "g _ r _ f _ e");
/// ```
pub fn hint_for(word: &str) -> String {
    word.chars()
        .enumerate()
        .map(|(i, c)| {
            if i % 2 == 1 && c.is_alphabetic() {
                '_'
            } else {
                c
            }
        })
        .map(String::from)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Ranks players by score, highest first.
///
/// The sort is stable, so tied players keep their join order. Ranks are
/// sequential from 1 even for ties.
pub fn leaderboard(players: &[PlayerInfo]) -> Vec<LeaderboardEntry> {
    let mut ranked: Vec<&PlayerInfo> = players.iter().collect();
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked
        .into_iter()
        .zip(1u32..)
        .map(|(p, rank)| LeaderboardEntry {
            rank,
            name: p.name.clone(),
            score: p.score,
        })
        .collect()
}
