//! Layered settings
//!
//! Defaults live in the serde attributes; a config file and
//! `SPEECH_BRIDGE__` environment variables override them. Nested fields use
//! double-underscore separators, e.g. `SPEECH_BRIDGE__CACHE__TRANSLATION_CAPACITY=5000`.

use serde::{Deserialize, Serialize};
use speech_bridge_core::{Error, Result};
use std::path::Path;

/// Root settings for the service
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub audio: AudioSettings,
    #[serde(default)]
    pub asr: AsrSettings,
    #[serde(default)]
    pub translation: TranslationSettings,
    #[serde(default)]
    pub tts: TtsSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub context: ContextSettings,
    #[serde(default)]
    pub pipeline: PipelineSettings,
    #[serde(default)]
    pub session: SessionSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioSettings {
    /// Sample rate streaming chunks are assumed to carry, in Hz
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Preferred chunk size in samples for clients that ask
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_sample_rate() -> u32 {
    16_000
}

fn default_chunk_size() -> usize {
    4096
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            chunk_size: default_chunk_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsrSettings {
    #[serde(default = "default_asr_language")]
    pub default_language: String,
    /// RMS amplitude below which a chunk counts as silence
    #[serde(default = "default_silence_threshold")]
    pub silence_threshold: f32,
    /// Silence must persist this long before a segment is final, in ms
    #[serde(default = "default_min_silence_ms")]
    pub min_silence_ms: u64,
    /// Buffered samples required before partial transcripts are produced
    #[serde(default = "default_min_partial_samples")]
    pub min_partial_samples: usize,
}

fn default_asr_language() -> String {
    "vi".to_string()
}

fn default_silence_threshold() -> f32 {
    0.01
}

fn default_min_silence_ms() -> u64 {
    500
}

fn default_min_partial_samples() -> usize {
    // one second at 16 kHz
    16_000
}

impl Default for AsrSettings {
    fn default() -> Self {
        Self {
            default_language: default_asr_language(),
            silence_threshold: default_silence_threshold(),
            min_silence_ms: default_min_silence_ms(),
            min_partial_samples: default_min_partial_samples(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationSettings {
    #[serde(default = "default_source_lang")]
    pub default_source: String,
    #[serde(default = "default_target_lang")]
    pub default_target: String,
}

fn default_source_lang() -> String {
    "vi".to_string()
}

fn default_target_lang() -> String {
    "en".to_string()
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            default_source: default_source_lang(),
            default_target: default_target_lang(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsSettings {
    #[serde(default = "default_voice")]
    pub default_voice: String,
}

fn default_voice() -> String {
    "default".to_string()
}

impl Default for TtsSettings {
    fn default() -> Self {
        Self {
            default_voice: default_voice(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_translation_capacity")]
    pub translation_capacity: usize,
    #[serde(default = "default_asr_capacity")]
    pub asr_capacity: usize,
    #[serde(default = "default_tts_capacity")]
    pub tts_capacity: usize,
}

fn default_translation_capacity() -> usize {
    10_000
}

fn default_asr_capacity() -> usize {
    1_000
}

fn default_tts_capacity() -> usize {
    1_000
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            translation_capacity: default_translation_capacity(),
            asr_capacity: default_asr_capacity(),
            tts_capacity: default_tts_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSettings {
    /// Words per chunk when ingesting reference documents
    #[serde(default = "default_chunk_words")]
    pub chunk_words: usize,
    /// Word overlap between neighbouring chunks
    #[serde(default = "default_overlap_words")]
    pub overlap_words: usize,
    /// Snippets retrieved per context lookup
    #[serde(default = "default_num_results")]
    pub num_results: usize,
    /// Cap on extracted domain terms
    #[serde(default = "default_max_terms")]
    pub max_terms: usize,
}

fn default_chunk_words() -> usize {
    500
}

fn default_overlap_words() -> usize {
    50
}

fn default_num_results() -> usize {
    3
}

fn default_max_terms() -> usize {
    20
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            chunk_words: default_chunk_words(),
            overlap_words: default_overlap_words(),
            num_results: default_num_results(),
            max_terms: default_max_terms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Budget per collaborator call, in ms
    #[serde(default = "default_stage_timeout_ms")]
    pub stage_timeout_ms: u64,
}

fn default_stage_timeout_ms() -> u64 {
    30_000
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            stage_timeout_ms: default_stage_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Inactive sessions older than this are eligible for cleanup, in seconds
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    /// How often the cleanup task scans the registry, in seconds
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

fn default_idle_timeout_secs() -> u64 {
    3600
}

fn default_cleanup_interval_secs() -> u64 {
    300
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

impl Settings {
    /// Reject values that would break the pipeline at runtime
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate == 0 {
            return Err(Error::Config("audio.sample_rate must be non-zero".into()));
        }
        if !(0.0..=1.0).contains(&self.asr.silence_threshold) {
            return Err(Error::Config(
                "asr.silence_threshold must be within [0.0, 1.0]".into(),
            ));
        }
        if self.cache.translation_capacity == 0
            || self.cache.asr_capacity == 0
            || self.cache.tts_capacity == 0
        {
            return Err(Error::Config("cache capacities must be non-zero".into()));
        }
        if self.context.chunk_words == 0 {
            return Err(Error::Config("context.chunk_words must be non-zero".into()));
        }
        if self.context.overlap_words >= self.context.chunk_words {
            return Err(Error::Config(
                "context.overlap_words must be smaller than context.chunk_words".into(),
            ));
        }
        if self.pipeline.stage_timeout_ms == 0 {
            return Err(Error::Config(
                "pipeline.stage_timeout_ms must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Load settings from an optional file plus environment overrides.
///
/// Layering, lowest to highest precedence: struct defaults, `path` if it
/// exists, then `SPEECH_BRIDGE__*` environment variables.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else {
            tracing::warn!(path = %path.display(), "config file not found, using defaults");
        }
    }

    let raw = builder
        .add_source(
            config::Environment::with_prefix("SPEECH_BRIDGE")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()
        .map_err(|e| Error::Config(e.to_string()))?;

    let settings: Settings = raw
        .try_deserialize()
        .map_err(|e| Error::Config(e.to_string()))?;
    settings.validate()?;
    Ok(settings)
}
