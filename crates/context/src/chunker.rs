//! Word-window document chunking

/// Split text into overlapping word windows.
///
/// Each chunk holds up to `chunk_words` words; consecutive chunks share
/// `overlap_words` words so sentences straddling a boundary stay
/// retrievable. `overlap_words` must be smaller than `chunk_words`
/// (enforced by config validation).
pub fn chunk_text(text: &str, chunk_words: usize, overlap_words: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }
    if words.len() <= chunk_words {
        return vec![words.join(" ")];
    }

    let step = chunk_words.saturating_sub(overlap_words).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < words.len() {
        let end = (start + chunk_words).min(words.len());
        chunks.push(words[start..end].join(" "));
        if end == words.len() {
            break;
        }
        start += step;
    }
    chunks
}
