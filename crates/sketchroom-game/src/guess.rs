//! Classifying chat lines against the secret word.

/// How a guesser's chat line relates to the secret word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Case-insensitive exact match.
    Correct,
    /// Would leak the word if broadcast; reply "Too close!" instead.
    TooClose,
    /// Ordinary chat.
    Chat,
}

/// Classifies `guess` (already trimmed) against `word`.
///
/// A guess is too close when it contains the word, or when it is at least
/// `near_miss_min_len` characters long and the word contains it.
pub fn evaluate(guess: &str, word: &str, near_miss_min_len: usize) -> Verdict {
    let guess = guess.to_lowercase();
    let word = word.to_lowercase();

    if guess == word {
        Verdict::Correct
    } else if guess.contains(&word)
        || (guess.chars().count() >= near_miss_min_len && word.contains(&guess))
    {
        Verdict::TooClose
    } else {
        Verdict::Chat
    }
}

/// `true` when `text` mentions `word` anywhere, ignoring case.
pub fn mentions(text: &str, word: &str) -> bool {
    text.to_lowercase().contains(&word.to_lowercase())
}

/// Trims `raw` and cuts it to at most `max_chars` characters.
pub fn clean_text(raw: &str, max_chars: usize) -> String {
    raw.trim().chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_is_correct_in_any_case() {
        assert_eq!(evaluate("cat", "cat", 3), Verdict::Correct);
        assert_eq!(evaluate("CaT", "cat", 3), Verdict::Correct);
        assert_eq!(evaluate("giraffe", "Giraffe", 3), Verdict::Correct);
    }

    #[test]
    fn test_guess_containing_word_is_too_close() {
        assert_eq!(evaluate("cats", "cat", 3), Verdict::TooClose);
        assert_eq!(evaluate("is it cat?", "cat", 3), Verdict::TooClose);
    }

    #[test]
    fn test_long_fragment_of_word_is_too_close() {
        assert_eq!(evaluate("gira", "giraffe", 3), Verdict::TooClose);
        assert_eq!(evaluate("FFE", "giraffe", 3), Verdict::TooClose);
    }

    #[test]
    fn test_short_fragment_is_chat() {
        assert_eq!(evaluate("gi", "giraffe", 3), Verdict::Chat);
        assert_eq!(evaluate("a", "cat", 3), Verdict::Chat);
    }

    #[test]
    fn test_unrelated_guess_is_chat() {
        assert_eq!(evaluate("dog", "cat", 3), Verdict::Chat);
        assert_eq!(evaluate("hello there", "cat", 3), Verdict::Chat);
    }

    #[test]
    fn test_mentions_ignores_case() {
        assert!(mentions("it's a CAT lol", "cat"));
        assert!(!mentions("it's a dog", "cat"));
    }

    #[test]
    fn test_clean_text_trims_and_truncates() {
        assert_eq!(clean_text("  hi  ", 200), "hi");
        assert_eq!(clean_text("abcdef", 3), "abc");
        assert_eq!(clean_text("ééé", 2), "éé");
    }
}
