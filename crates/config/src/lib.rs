//! Configuration for the speech translation service
//!
//! Settings are loaded in layers: built-in defaults, an optional config
//! file, then `SPEECH_BRIDGE__` environment variables. Every field has a
//! serde default so a bare deployment starts with sane values.

pub mod languages;
pub mod settings;

pub use languages::{is_supported_language, language_name, supported_languages};
pub use settings::{
    load_settings, AsrSettings, AudioSettings, CacheSettings, ContextSettings, PipelineSettings,
    ServerSettings, SessionSettings, Settings, TranslationSettings, TtsSettings,
};
