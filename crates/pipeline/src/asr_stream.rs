//! Streaming ASR sub-sessions
//!
//! Realizes the incremental ASR contract over a batch recognizer. Each
//! sub-session accumulates PCM into a segment buffer; sustained silence at
//! the buffer's tail closes the segment and yields a final transcript for
//! it. Accumulations shorter than that produce partial transcripts once
//! the buffer passes a minimum length.

use std::sync::Arc;

use dashmap::DashMap;
use speech_bridge_config::AsrSettings;
use speech_bridge_core::audio::{duration_secs, peak, pcm16_to_f32, rms};
use speech_bridge_core::types::{FinalTranscript, PartialTranscript};
use speech_bridge_core::{Error, Result, SpeechRecognizer, Stage};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Outcome of closing a sub-session
#[derive(Debug, Clone)]
pub struct ClosedAsrSession {
    /// Transcript over everything the sub-session heard
    pub transcript: FinalTranscript,
    /// Text recognized from audio still buffered at stop time, if any
    pub tail: Option<String>,
}

struct SubSession {
    language: String,
    /// Current segment, mono f32 PCM
    buffer: Vec<f32>,
    /// Finalized segment texts so far
    transcript: String,
    confidences: Vec<f32>,
    total_samples: usize,
    /// Consecutive silent samples at the buffer tail
    trailing_silence: usize,
}

impl SubSession {
    fn append_segment(&mut self, text: &str, confidence: f32) {
        if !self.transcript.is_empty() {
            self.transcript.push(' ');
        }
        self.transcript.push_str(text.trim());
        self.confidences.push(confidence);
    }

    fn average_confidence(&self) -> f32 {
        if self.confidences.is_empty() {
            0.0
        } else {
            self.confidences.iter().sum::<f32>() / self.confidences.len() as f32
        }
    }
}

/// Host for concurrent streaming ASR sub-sessions
pub struct AsrSessionHost {
    recognizer: Arc<dyn SpeechRecognizer>,
    settings: AsrSettings,
    sample_rate: u32,
    sessions: DashMap<String, Arc<Mutex<SubSession>>>,
}

impl AsrSessionHost {
    pub fn new(
        recognizer: Arc<dyn SpeechRecognizer>,
        settings: AsrSettings,
        sample_rate: u32,
    ) -> Self {
        Self {
            recognizer,
            settings,
            sample_rate,
            sessions: DashMap::new(),
        }
    }

    pub fn start(&self, language: &str) -> Result<String> {
        if language.trim().is_empty() {
            return Err(Error::validation("language must not be empty"));
        }
        let id = Uuid::new_v4().simple().to_string();
        self.sessions.insert(
            id.clone(),
            Arc::new(Mutex::new(SubSession {
                language: language.to_string(),
                buffer: Vec::new(),
                transcript: String::new(),
                confidences: Vec::new(),
                total_samples: 0,
                trailing_silence: 0,
            })),
        );
        tracing::debug!(asr_session_id = %id, language, "ASR sub-session started");
        Ok(id)
    }

    /// Feed a PCM16LE chunk, returning the incremental transcript
    pub async fn feed(&self, id: &str, chunk: &[u8]) -> Result<PartialTranscript> {
        if chunk.is_empty() {
            return Err(Error::validation("empty audio chunk"));
        }
        let session = self.lookup(id)?;
        let mut session = session.lock().await;

        let samples = pcm16_to_f32(chunk);
        session.total_samples += samples.len();
        if rms(&samples) < self.settings.silence_threshold {
            session.trailing_silence += samples.len();
        } else {
            session.trailing_silence = 0;
        }
        session.buffer.extend_from_slice(&samples);

        let min_silence_samples =
            (self.sample_rate as u64 * self.settings.min_silence_ms / 1000) as usize;

        if session.trailing_silence >= min_silence_samples {
            if peak(&session.buffer) < self.settings.silence_threshold {
                // Nothing but silence buffered; drop it so the buffer
                // does not grow across a long pause.
                session.buffer.clear();
                return Ok(PartialTranscript::empty());
            }
            let result = self.transcribe(&session.buffer, &session.language).await?;
            session.buffer.clear();
            session.trailing_silence = 0;
            session.append_segment(&result.text, result.confidence());
            return Ok(PartialTranscript {
                text: result.text,
                is_final: true,
            });
        }

        if session.buffer.len() >= self.settings.min_partial_samples
            && peak(&session.buffer) >= self.settings.silence_threshold
        {
            let result = self.transcribe(&session.buffer, &session.language).await?;
            return Ok(PartialTranscript {
                text: result.text,
                is_final: false,
            });
        }

        Ok(PartialTranscript::empty())
    }

    /// Close a sub-session, transcribing any buffered remainder
    pub async fn stop(&self, id: &str) -> Result<ClosedAsrSession> {
        let (_, session) = self
            .sessions
            .remove(id)
            .ok_or_else(|| Error::UnknownAsrSession(id.to_string()))?;
        let mut session = session.lock().await;

        let mut tail = None;
        if peak(&session.buffer) >= self.settings.silence_threshold {
            let buffer = std::mem::take(&mut session.buffer);
            let result = self.transcribe(&buffer, &session.language).await?;
            if !result.text.trim().is_empty() {
                session.append_segment(&result.text, result.confidence());
                tail = Some(result.text);
            }
        }

        let transcript = FinalTranscript {
            text: session.transcript.clone(),
            confidence: session.average_confidence(),
            duration: duration_secs(session.total_samples, self.sample_rate),
        };
        tracing::debug!(asr_session_id = %id, duration = transcript.duration, "ASR sub-session closed");
        Ok(ClosedAsrSession { transcript, tail })
    }

    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }

    fn lookup(&self, id: &str) -> Result<Arc<Mutex<SubSession>>> {
        self.sessions
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| Error::UnknownAsrSession(id.to_string()))
    }

    async fn transcribe(
        &self,
        samples: &[f32],
        language: &str,
    ) -> Result<speech_bridge_core::types::AsrResult> {
        self.recognizer
            .transcribe(samples, language)
            .await
            .map_err(|e| Error::collaborator(Stage::Asr, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speech_bridge_core::audio::f32_to_pcm16;
    use speech_bridge_core::types::AsrResult;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedRecognizer {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl SpeechRecognizer for ScriptedRecognizer {
        async fn transcribe(&self, samples: &[f32], language: &str) -> Result<AsrResult> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(AsrResult {
                text: format!("segment-{} ({} samples)", n, samples.len()),
                language: language.to_string(),
                language_probability: 0.8,
                segments: vec![],
                is_final: true,
            })
        }
    }

    fn host() -> AsrSessionHost {
        AsrSessionHost::new(
            Arc::new(ScriptedRecognizer {
                calls: AtomicUsize::new(0),
            }),
            AsrSettings {
                default_language: "vi".to_string(),
                silence_threshold: 0.01,
                min_silence_ms: 500,
                min_partial_samples: 16_000,
            },
            16_000,
        )
    }

    fn speech_chunk(samples: usize) -> Vec<u8> {
        f32_to_pcm16(&vec![0.5; samples])
    }

    fn silence_chunk(samples: usize) -> Vec<u8> {
        f32_to_pcm16(&vec![0.0; samples])
    }

    #[tokio::test]
    async fn test_short_speech_yields_nothing_yet() {
        let host = host();
        let id = host.start("vi").unwrap();
        let partial = host.feed(&id, &speech_chunk(1000)).await.unwrap();
        assert!(partial.text.is_empty());
        assert!(!partial.is_final);
    }

    #[tokio::test]
    async fn test_long_speech_yields_partial() {
        let host = host();
        let id = host.start("vi").unwrap();
        let partial = host.feed(&id, &speech_chunk(20_000)).await.unwrap();
        assert!(!partial.text.is_empty());
        assert!(!partial.is_final);
    }

    #[tokio::test]
    async fn test_sustained_silence_finalizes_segment() {
        let host = host();
        let id = host.start("vi").unwrap();

        host.feed(&id, &speech_chunk(4000)).await.unwrap();
        // 500ms at 16kHz is 8000 samples of silence
        let result = host.feed(&id, &silence_chunk(8000)).await.unwrap();
        assert!(result.is_final);
        assert!(!result.text.is_empty());
    }

    #[tokio::test]
    async fn test_pure_silence_never_finalizes() {
        let host = host();
        let id = host.start("vi").unwrap();
        let result = host.feed(&id, &silence_chunk(20_000)).await.unwrap();
        assert!(result.text.is_empty());
        assert!(!result.is_final);
    }

    #[tokio::test]
    async fn test_stop_transcribes_remainder() {
        let host = host();
        let id = host.start("vi").unwrap();
        host.feed(&id, &speech_chunk(4000)).await.unwrap();

        let closed = host.stop(&id).await.unwrap();
        assert!(closed.tail.is_some());
        assert!(!closed.transcript.text.is_empty());
        assert!((closed.transcript.duration - 0.25).abs() < 1e-6);
        assert_eq!(host.active_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_session_rejected() {
        let host = host();
        assert!(host.feed("nope", &speech_chunk(100)).await.is_err());
        assert!(host.stop("nope").await.is_err());
    }
}
