//! Terminology extraction
//!
//! Two strategies over an ingested document: glossary lines (`term =
//! translation` or `term : translation`) for the domain vocabulary handed
//! to translators, and frequency-ranked content words as key terms.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use unicode_segmentation::UnicodeSegmentation;

static GLOSSARY_LINE: Lazy<Regex> = Lazy::new(|| {
    // term separator translation; separator is '=' or ':' with optional spaces
    Regex::new(r"^\s*([^=:]{1,80}?)\s*[=:]\s*(.{1,120}?)\s*$").unwrap()
});

/// Extract `term -> translation` pairs from glossary-style lines.
///
/// Lines that do not look like a glossary entry are skipped. At most
/// `max_terms` pairs are returned, in document order.
pub fn glossary_pairs(text: &str, max_terms: usize) -> HashMap<String, String> {
    let mut pairs = HashMap::new();
    for line in text.lines() {
        if pairs.len() >= max_terms {
            break;
        }
        let Some(caps) = GLOSSARY_LINE.captures(line) else {
            continue;
        };
        let term = caps[1].trim().to_lowercase();
        let translation = caps[2].trim().to_string();
        if term.is_empty() || translation.is_empty() {
            continue;
        }
        pairs.insert(term, translation);
    }
    pairs
}

/// Frequency-ranked content words, longest-streak of the document.
///
/// Words shorter than 3 graphemes are dropped as connective noise. Ties
/// break alphabetically so output is stable.
pub fn key_terms(text: &str, max_terms: usize) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for word in text.unicode_words() {
        if word.graphemes(true).count() < 3 {
            continue;
        }
        *counts.entry(word.to_lowercase()).or_insert(0) += 1;
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(max_terms);
    ranked.into_iter().map(|(w, _)| w).collect()
}
