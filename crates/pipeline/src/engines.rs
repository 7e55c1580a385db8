//! Built-in stub engines
//!
//! Used when real models are not wired in: the server still starts, the
//! whole pipeline is exercisable, and output shapes are valid. The
//! translator passes text through, the synthesizer renders silence as a
//! proper WAV container, and the recognizer reports an empty transcript.

use speech_bridge_core::audio::encode_wav;
use speech_bridge_core::types::{AsrResult, AudioBlob, TranslationRequest};
use speech_bridge_core::{Result, SpeechRecognizer, SpeechSynthesizer, Translator};

/// Translator that returns the input unchanged
pub struct NoopTranslator;

#[async_trait::async_trait]
impl Translator for NoopTranslator {
    async fn translate(&self, request: &TranslationRequest) -> Result<String> {
        Ok(request.text.clone())
    }
}

/// Synthesizer producing a short silent WAV
pub struct SilenceSynthesizer {
    sample_rate: u32,
    duration_ms: u64,
}

impl SilenceSynthesizer {
    pub fn new(sample_rate: u32, duration_ms: u64) -> Self {
        Self {
            sample_rate,
            duration_ms,
        }
    }
}

impl Default for SilenceSynthesizer {
    fn default() -> Self {
        Self::new(16_000, 250)
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for SilenceSynthesizer {
    async fn synthesize(&self, _text: &str, _language: &str, _voice: &str) -> Result<AudioBlob> {
        let samples =
            vec![0.0f32; (self.sample_rate as u64 * self.duration_ms / 1000) as usize];
        let bytes = encode_wav(&samples, self.sample_rate)?;
        Ok(AudioBlob::wav(bytes, self.sample_rate))
    }
}

/// Recognizer that hears nothing
pub struct StubRecognizer;

#[async_trait::async_trait]
impl SpeechRecognizer for StubRecognizer {
    async fn transcribe(&self, _samples: &[f32], language: &str) -> Result<AsrResult> {
        Ok(AsrResult {
            text: String::new(),
            language: language.to_string(),
            language_probability: 1.0,
            segments: vec![],
            is_final: true,
        })
    }
}
