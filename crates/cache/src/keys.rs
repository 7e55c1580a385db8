//! Cache key construction
//!
//! Keys are deterministic functions of the request: byte-identical audio,
//! or normalized text plus the parameters that change the output, always
//! map to the same key.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use speech_bridge_core::text::normalize_text;

/// Stable 64-bit digest of raw bytes
pub fn content_hash(bytes: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    hasher.finish()
}

/// Translation key: language pair, context scope, normalized text.
/// Requests with and without a context never share a key.
pub fn translation_key(
    source_lang: &str,
    target_lang: &str,
    context_id: Option<&str>,
    text: &str,
) -> String {
    format!(
        "{}:{}:{}:{}",
        source_lang,
        target_lang,
        context_id.unwrap_or(""),
        normalize_text(text)
    )
}

/// ASR key: digest of the audio bytes plus the requested language
pub fn asr_key(audio: &[u8], language: &str) -> String {
    format!("{:016x}:{}", content_hash(audio), language)
}

/// TTS key: digest of the normalized text plus voice and language
pub fn tts_key(text: &str, language: &str, voice: &str) -> String {
    let normalized = normalize_text(text);
    format!(
        "{:016x}:{}:{}",
        content_hash(normalized.as_bytes()),
        language,
        voice
    )
}
