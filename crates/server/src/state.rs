//! Shared application state

use std::sync::Arc;
use std::time::Duration;

use speech_bridge_cache::ResultCache;
use speech_bridge_config::Settings;
use speech_bridge_context::ContextStore;
use speech_bridge_core::{ContextProvider, SpeechRecognizer, SpeechSynthesizer, Translator};
use speech_bridge_pipeline::{
    AsrSessionHost, AsrStage, NoopTranslator, SilenceSynthesizer, StreamingSessionManager,
    StubRecognizer, TranslationStage, TtsStage,
};

/// Everything the handlers share, wired once at startup
pub struct AppState {
    pub settings: Settings,
    pub cache: Arc<ResultCache>,
    pub contexts: Arc<ContextStore>,
    pub asr: Arc<AsrStage>,
    pub translation: Arc<TranslationStage>,
    pub tts: Arc<TtsStage>,
    pub sessions: Arc<StreamingSessionManager>,
}

impl AppState {
    /// Wire the pipeline around the given engines
    pub fn with_engines(
        settings: Settings,
        recognizer: Arc<dyn SpeechRecognizer>,
        translator: Arc<dyn Translator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        let cache = Arc::new(ResultCache::new(
            settings.cache.translation_capacity,
            settings.cache.asr_capacity,
            settings.cache.tts_capacity,
        ));
        let contexts = Arc::new(ContextStore::new(settings.context.clone()));
        let timeout = Duration::from_millis(settings.pipeline.stage_timeout_ms);

        let asr = Arc::new(AsrStage::new(
            Arc::clone(&recognizer),
            Arc::clone(&cache),
            settings.audio.sample_rate,
            timeout,
        ));
        let translation = Arc::new(TranslationStage::new(
            translator,
            Some(Arc::clone(&contexts) as Arc<dyn ContextProvider>),
            Arc::clone(&cache),
            timeout,
            settings.context.num_results,
        ));
        let tts = Arc::new(TtsStage::new(synthesizer, Arc::clone(&cache), timeout));

        let asr_host = Arc::new(AsrSessionHost::new(
            recognizer,
            settings.asr.clone(),
            settings.audio.sample_rate,
        ));
        let sessions = Arc::new(StreamingSessionManager::new(
            asr_host,
            Arc::clone(&translation),
            Arc::clone(&tts),
        ));

        Self {
            settings,
            cache,
            contexts,
            asr,
            translation,
            tts,
            sessions,
        }
    }

    /// Wire stub engines: a pass-through translator, a silent synthesizer,
    /// and an empty-transcript recognizer. Lets the service run end to end
    /// with no models attached.
    pub fn with_stub_engines(settings: Settings) -> Self {
        let sample_rate = settings.audio.sample_rate;
        Self::with_engines(
            settings,
            Arc::new(StubRecognizer),
            Arc::new(NoopTranslator),
            Arc::new(SilenceSynthesizer::new(sample_rate, 250)),
        )
    }
}
