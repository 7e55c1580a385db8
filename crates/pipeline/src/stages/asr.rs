//! Batch ASR stage

use std::sync::Arc;
use std::time::Duration;

use speech_bridge_cache::{asr_key, ResultCache};
use speech_bridge_core::audio::decode_audio;
use speech_bridge_core::types::AsrResult;
use speech_bridge_core::{Error, Result, SpeechRecognizer, Stage};

use super::{call_collaborator, StageResult};

/// Wraps a speech recognizer with validation, caching, and a timeout
pub struct AsrStage {
    recognizer: Arc<dyn SpeechRecognizer>,
    cache: Arc<ResultCache>,
    default_sample_rate: u32,
    timeout: Duration,
}

impl AsrStage {
    pub fn new(
        recognizer: Arc<dyn SpeechRecognizer>,
        cache: Arc<ResultCache>,
        default_sample_rate: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            recognizer,
            cache,
            default_sample_rate,
            timeout,
        }
    }

    /// Transcribe a complete utterance from WAV or raw PCM16 bytes
    pub async fn transcribe(
        &self,
        audio: &[u8],
        language: &str,
        use_cache: bool,
    ) -> Result<StageResult<AsrResult>> {
        if language.trim().is_empty() {
            return Err(Error::validation("language must not be empty"));
        }
        // Rejects empty payloads and unreadable containers before any lookup
        let (samples, _rate) = decode_audio(audio, self.default_sample_rate)?;

        let key = asr_key(audio, language);
        if use_cache {
            if let Some(hit) = self.cache.get_asr(&key) {
                tracing::debug!(language, "ASR cache hit");
                return Ok(StageResult::cached(hit));
            }
        }

        let result = call_collaborator(
            Stage::Asr,
            self.timeout,
            self.recognizer.transcribe(&samples, language),
        )
        .await?;

        if use_cache {
            self.cache.put_asr(&key, result.clone());
        }
        Ok(StageResult::fresh(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speech_bridge_core::audio::f32_to_pcm16;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingRecognizer {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl SpeechRecognizer for CountingRecognizer {
        async fn transcribe(&self, _samples: &[f32], language: &str) -> Result<AsrResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(AsrResult {
                text: "xin chào".to_string(),
                language: language.to_string(),
                language_probability: 0.9,
                segments: vec![],
                is_final: true,
            })
        }
    }

    fn stage(recognizer: Arc<CountingRecognizer>) -> AsrStage {
        AsrStage::new(
            recognizer,
            Arc::new(ResultCache::new(8, 8, 8)),
            16_000,
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_cache_transparency() {
        let recognizer = Arc::new(CountingRecognizer {
            calls: AtomicUsize::new(0),
        });
        let stage = stage(recognizer.clone());
        let audio = f32_to_pcm16(&[0.1; 1600]);

        let first = stage.transcribe(&audio, "vi", true).await.unwrap();
        let second = stage.transcribe(&audio, "vi", true).await.unwrap();

        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(first.value, second.value);
        assert_eq!(recognizer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_opt_out_always_calls_model() {
        let recognizer = Arc::new(CountingRecognizer {
            calls: AtomicUsize::new(0),
        });
        let stage = stage(recognizer.clone());
        let audio = f32_to_pcm16(&[0.1; 1600]);

        stage.transcribe(&audio, "vi", false).await.unwrap();
        stage.transcribe(&audio, "vi", false).await.unwrap();
        assert_eq!(recognizer.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_audio_rejected_before_model() {
        let recognizer = Arc::new(CountingRecognizer {
            calls: AtomicUsize::new(0),
        });
        let stage = stage(recognizer.clone());

        let err = stage.transcribe(&[], "vi", true).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(recognizer.calls.load(Ordering::SeqCst), 0);
    }
}
