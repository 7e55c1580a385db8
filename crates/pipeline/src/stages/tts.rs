//! TTS stage

use std::sync::Arc;
use std::time::Duration;

use speech_bridge_cache::{tts_key, ResultCache};
use speech_bridge_core::text::is_blank;
use speech_bridge_core::types::AudioBlob;
use speech_bridge_core::{Error, Result, SpeechSynthesizer, Stage};

use super::{call_collaborator, StageResult};

pub struct TtsStage {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    cache: Arc<ResultCache>,
    timeout: Duration,
}

impl TtsStage {
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        cache: Arc<ResultCache>,
        timeout: Duration,
    ) -> Self {
        Self {
            synthesizer,
            cache,
            timeout,
        }
    }

    pub async fn synthesize(
        &self,
        text: &str,
        language: &str,
        voice: &str,
        use_cache: bool,
    ) -> Result<StageResult<AudioBlob>> {
        if is_blank(text) {
            return Err(Error::validation("text must not be empty"));
        }

        let key = tts_key(text, language, voice);
        if use_cache {
            if let Some(hit) = self.cache.get_tts(&key) {
                tracing::debug!(language, voice, "TTS cache hit");
                return Ok(StageResult::cached(hit));
            }
        }

        let audio = call_collaborator(
            Stage::Tts,
            self.timeout,
            self.synthesizer.synthesize(text, language, voice),
        )
        .await?;

        if use_cache {
            self.cache.put_tts(&key, audio.clone());
        }
        Ok(StageResult::fresh(audio))
    }

    pub fn available_voices(&self, language: Option<&str>) -> Vec<String> {
        self.synthesizer.available_voices(language)
    }
}
