//! Collaborator traits
//!
//! The pipeline depends on its expensive model calls only through these
//! traits. Real engines, stubs, and test fakes all implement the same
//! surface.

use crate::error::Result;
use crate::types::{AsrResult, AudioBlob, TranslationRequest};
use std::collections::HashMap;
use uuid::Uuid;

/// Batch speech recognition over a finished utterance
///
/// `samples` are mono f32 PCM in [-1.0, 1.0] at the configured sample rate.
#[async_trait::async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn transcribe(&self, samples: &[f32], language: &str) -> Result<AsrResult>;
}

/// Text-to-text translation across a language pair
#[async_trait::async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, request: &TranslationRequest) -> Result<String>;

    /// Detect the language of a text, returning `(code, confidence)`.
    /// Default implementation reports unknown with zero confidence.
    async fn detect_language(&self, _text: &str) -> Result<(String, f32)> {
        Ok(("und".to_string(), 0.0))
    }
}

/// Speech synthesis from text
#[async_trait::async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, language: &str, voice: &str) -> Result<AudioBlob>;

    /// Voices this synthesizer offers, optionally filtered by language
    fn available_voices(&self, _language: Option<&str>) -> Vec<String> {
        vec!["default".to_string()]
    }
}

/// Relevant-snippet retrieval and terminology lookup over ingested
/// reference documents
#[async_trait::async_trait]
pub trait ContextProvider: Send + Sync {
    /// Join the `limit` most relevant snippets for `text` into one string.
    /// Returns an empty string when nothing relevant is indexed.
    async fn context_for_text(&self, text: &str, context_id: Uuid, limit: usize)
        -> Result<String>;

    /// Domain terminology mapping (source term -> target term) derived from
    /// the context document, for the given language pair
    async fn domain_vocabulary(
        &self,
        context_id: Uuid,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<HashMap<String, String>>;
}
