//! Supported language table
//!
//! ISO 639-1 codes the translation collaborators are expected to handle.
//! The table gates request validation; collaborators may support more.

use once_cell::sync::Lazy;
use std::collections::HashMap;

static LANGUAGES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("vi", "Vietnamese"),
        ("en", "English"),
        ("zh", "Chinese"),
        ("ja", "Japanese"),
        ("ko", "Korean"),
        ("fr", "French"),
        ("de", "German"),
        ("es", "Spanish"),
        ("th", "Thai"),
        ("id", "Indonesian"),
        ("hi", "Hindi"),
        ("ru", "Russian"),
    ])
});

/// Whether `code` is in the supported table
pub fn is_supported_language(code: &str) -> bool {
    LANGUAGES.contains_key(code)
}

/// Human-readable name for a language code
pub fn language_name(code: &str) -> Option<&'static str> {
    LANGUAGES.get(code).copied()
}

/// All supported codes, sorted for stable output
pub fn supported_languages() -> Vec<&'static str> {
    let mut codes: Vec<&'static str> = LANGUAGES.keys().copied().collect();
    codes.sort_unstable();
    codes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_pair_supported() {
        assert!(is_supported_language("vi"));
        assert!(is_supported_language("en"));
        assert!(!is_supported_language("xx"));
    }

    #[test]
    fn test_language_name() {
        assert_eq!(language_name("vi"), Some("Vietnamese"));
        assert_eq!(language_name("xx"), None);
    }

    #[test]
    fn test_supported_languages_sorted() {
        let codes = supported_languages();
        let mut sorted = codes.clone();
        sorted.sort_unstable();
        assert_eq!(codes, sorted);
        assert!(codes.contains(&"en"));
    }
}
