//! Result types shared across the pipeline

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Word-level timing inside a transcript segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTiming {
    pub word: String,
    pub start: f64,
    pub end: f64,
    pub probability: f32,
}

/// A time-aligned transcript segment
///
/// Segments are ordered by time; neighbouring `[start, end)` ranges do not
/// overlap except where produced by boundary smoothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsrSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    #[serde(default)]
    pub words: Vec<WordTiming>,
}

/// Full speech recognition result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AsrResult {
    pub text: String,
    pub language: String,
    /// Probability the detected language is correct
    pub language_probability: f32,
    #[serde(default)]
    pub segments: Vec<AsrSegment>,
    #[serde(default)]
    pub is_final: bool,
}

impl AsrResult {
    /// Average word confidence across all segments, if word timings exist
    pub fn confidence(&self) -> f32 {
        let words: Vec<&WordTiming> = self
            .segments
            .iter()
            .flat_map(|s| s.words.iter())
            .collect();
        if words.is_empty() {
            self.language_probability
        } else {
            words.iter().map(|w| w.probability).sum::<f32>() / words.len() as f32
        }
    }

    /// End time of the last segment in seconds
    pub fn duration(&self) -> f64 {
        self.segments.last().map(|s| s.end).unwrap_or(0.0)
    }
}

/// Incremental transcript from a streaming ASR sub-session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialTranscript {
    pub text: String,
    pub is_final: bool,
}

impl PartialTranscript {
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            is_final: false,
        }
    }
}

/// Final transcript returned when a streaming ASR sub-session closes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalTranscript {
    pub text: String,
    pub confidence: f32,
    /// Total audio duration fed into the sub-session, in seconds
    pub duration: f64,
}

/// Request passed to the translation collaborator
///
/// `context_text` and `domain_terms` carry optional enrichment retrieved
/// from a context document; collaborators may ignore either.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub text: String,
    pub source_lang: String,
    pub target_lang: String,
    #[serde(default)]
    pub context_text: Option<String>,
    #[serde(default)]
    pub domain_terms: Option<HashMap<String, String>>,
}

impl TranslationRequest {
    pub fn new(
        text: impl Into<String>,
        source_lang: impl Into<String>,
        target_lang: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
            context_text: None,
            domain_terms: None,
        }
    }
}

/// Completed translation, paired with the original text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationOutcome {
    pub original: String,
    pub translation: String,
    pub source_lang: String,
    pub target_lang: String,
}

/// Synthesized audio with its container format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioBlob {
    pub bytes: Vec<u8>,
    pub format: String,
    pub sample_rate: u32,
}

impl AudioBlob {
    pub fn wav(bytes: Vec<u8>, sample_rate: u32) -> Self {
        Self {
            bytes,
            format: "wav".to_string(),
            sample_rate,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(p: f32) -> WordTiming {
        WordTiming {
            word: "w".to_string(),
            start: 0.0,
            end: 0.1,
            probability: p,
        }
    }

    #[test]
    fn test_confidence_averages_words() {
        let result = AsrResult {
            text: "a b".to_string(),
            language: "en".to_string(),
            language_probability: 0.2,
            segments: vec![AsrSegment {
                start: 0.0,
                end: 1.0,
                text: "a b".to_string(),
                words: vec![word(0.8), word(0.6)],
            }],
            is_final: true,
        };
        assert!((result.confidence() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_confidence_falls_back_to_language_probability() {
        let result = AsrResult {
            language_probability: 0.9,
            ..Default::default()
        };
        assert!((result.confidence() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_duration_uses_last_segment() {
        let mut result = AsrResult::default();
        assert_eq!(result.duration(), 0.0);
        result.segments.push(AsrSegment {
            start: 0.0,
            end: 2.5,
            text: String::new(),
            words: vec![],
        });
        assert_eq!(result.duration(), 2.5);
    }
}
