//! The word bank drawers choose from.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};

use crate::GameError;

/// The stock word list.
pub const DEFAULT_WORDS: &[&str] = &[
    "cat", "dog", "house", "tree", "car", "sun", "moon", "star", "fish", "bird",
    "apple", "banana", "pizza", "cake", "rainbow", "rocket", "castle", "dragon",
    "unicorn", "computer", "phone", "book", "mountain", "ocean", "giraffe",
    "elephant", "penguin", "butterfly", "flower", "heart", "smile", "fire",
];

/// An immutable list of distinct candidate words.
///
/// Words are trimmed and de-duplicated case-insensitively on construction
/// (the first spelling wins), so any sample drawn from the bank is made of
/// distinct words.
#[derive(Debug, Clone)]
pub struct WordBank {
    words: Vec<String>,
}

impl WordBank {
    /// Builds a bank from any list of words.
    ///
    /// # Errors
    /// Returns [`GameError::EmptyWordBank`] if no non-blank word remains.
    pub fn new<I, S>(words: I) -> Result<Self, GameError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let words: Vec<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_string())
            .filter(|w| !w.is_empty())
            .filter(|w| seen.insert(w.to_lowercase()))
            .collect();

        if words.is_empty() {
            return Err(GameError::EmptyWordBank);
        }
        Ok(Self { words })
    }

    /// Picks `n` distinct words uniformly at random, in random order.
    ///
    /// Returns every word (shuffled) when the bank holds fewer than `n`.
    pub fn pick<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<String> {
        let mut picked: Vec<String> =
            self.words.choose_multiple(rng, n).cloned().collect();
        picked.shuffle(rng);
        picked
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }
}

impl Default for WordBank {
    fn default() -> Self {
        Self {
            words: DEFAULT_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}
