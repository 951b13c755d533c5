//! Text normalization patterns for claims.
//!
//! Claims arrive as free-form headlines. Before they are sent to the search
//! API they are reduced to a short keyword query: punctuation removed and
//! only the leading words kept, which bounds query length and improves
//! recall on relevance-ranked search.

use lazy_static::lazy_static;
use regex::Regex;

/// Default number of words kept in a search query.
pub const DEFAULT_QUERY_WORDS: usize = 6;

lazy_static! {
    /// Anything that is neither a word character nor whitespace
    pub static ref PUNCTUATION_PATTERN: Regex = Regex::new(r"[^\w\s]").unwrap();
}

/// Remove punctuation from text, keeping letters, digits, `_` and whitespace.
pub fn strip_punctuation(text: &str) -> String {
    PUNCTUATION_PATTERN.replace_all(text, "").into_owned()
}

/// Build a search query from a claim title.
///
/// Punctuation is stripped and the first `max_words` whitespace-separated
/// tokens are joined with single spaces.
pub fn search_query(title: &str, max_words: usize) -> String {
    strip_punctuation(title)
        .split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_strip_punctuation() {
        assert_eq!(strip_punctuation("PM resigns?! (again)"), "PM resigns again");
    }

    #[test]
    fn test_search_query_keeps_first_words() {
        let query = search_query(
            "BREAKING: Government announces 3-day holiday for all schools next week",
            DEFAULT_QUERY_WORDS,
        );
        assert_eq!(query, "BREAKING Government announces 3day holiday for");
    }

    #[test]
    fn test_search_query_collapses_whitespace() {
        assert_eq!(search_query("  Fuel   price\tcut  ", 6), "Fuel price cut");
    }

    #[test]
    fn test_search_query_keeps_non_ascii_words() {
        assert_eq!(search_query("काठमाडौंमा भारी वर्षा!", 6), "काठमाडौंमा भारी वर्षा");
    }

    proptest! {
        #[test]
        fn prop_query_is_bounded(title in ".{0,200}", words in 1usize..10) {
            let query = search_query(&title, words);
            prop_assert!(query.split_whitespace().count() <= words);
            prop_assert!(!PUNCTUATION_PATTERN.is_match(&query));
        }
    }
}
