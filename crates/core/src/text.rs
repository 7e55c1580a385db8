//! Text normalization and word utilities

use unicode_segmentation::UnicodeSegmentation;

/// Normalize text for cache keys and comparisons: lowercase and collapse
/// runs of whitespace into single spaces.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Unicode word count
pub fn word_count(text: &str) -> usize {
    text.unicode_words().count()
}

/// Split text into Unicode words
pub fn words(text: &str) -> Vec<&str> {
    text.unicode_words().collect()
}

/// Whether the text contains no words at all
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Truncate to at most `max_words` words, preserving original spacing
/// between the kept words.
pub fn truncate_words(text: &str, max_words: usize) -> String {
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize_text("  Hello\t WORLD \n"), "hello world");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize_text("   "), "");
    }

    #[test]
    fn test_word_count_unicode() {
        assert_eq!(word_count("bonjour le monde"), 3);
        assert_eq!(word_count("can't stop"), 2);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn test_truncate_words() {
        assert_eq!(truncate_words("one two three four", 2), "one two");
        assert_eq!(truncate_words("one", 5), "one");
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(" \t\n"));
        assert!(!is_blank("x"));
    }
}
