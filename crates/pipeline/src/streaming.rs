//! Streaming session manager
//!
//! Owns the registry of live translation sessions and drives the
//! ASR -> translation -> TTS chain for every fed chunk. Registry access is
//! concurrent; all of one session's mutable state sits behind its own fair
//! async mutex, so chunks for a session are processed strictly in feed
//! order and never concurrently, while distinct sessions proceed in
//! parallel.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use speech_bridge_config::is_supported_language;
use speech_bridge_core::text::is_blank;
use speech_bridge_core::types::{AudioBlob, FinalTranscript};
use speech_bridge_core::{Error, Result};
use tokio::sync::{watch, Mutex};
use uuid::Uuid;

use crate::asr_stream::AsrSessionHost;
use crate::events::{EventSink, SessionEvent};
use crate::stages::{TranslationStage, TtsStage};

fn default_true() -> bool {
    true
}

fn default_voice() -> String {
    "default".to_string()
}

/// Per-session configuration fixed at start
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub source_lang: String,
    pub target_lang: String,
    #[serde(default)]
    pub context_id: Option<Uuid>,
    #[serde(default = "default_true")]
    pub tts_enabled: bool,
    #[serde(default = "default_voice")]
    pub voice: String,
    #[serde(default = "default_true")]
    pub use_cache: bool,
}

impl SessionConfig {
    pub fn new(source_lang: impl Into<String>, target_lang: impl Into<String>) -> Self {
        Self {
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
            context_id: None,
            tts_enabled: true,
            voice: default_voice(),
            use_cache: true,
        }
    }
}

struct SessionState {
    asr_session_id: String,
    is_active: bool,
    chunks_received: u64,
    last_transcript: String,
    last_translation: Option<String>,
    last_audio: Option<AudioBlob>,
    last_activity: DateTime<Utc>,
}

struct StreamingSession {
    id: Uuid,
    config: SessionConfig,
    created_at: DateTime<Utc>,
    sink: Arc<dyn EventSink>,
    state: Mutex<SessionState>,
}

/// Latest known results after one fed chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkOutcome {
    pub text: String,
    pub is_final: bool,
    pub translation: Option<String>,
    pub has_audio: bool,
}

/// Best-known aggregate returned by `stop`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopSummary {
    pub session_id: Uuid,
    pub transcript: FinalTranscript,
    pub translation: Option<String>,
    pub has_audio: bool,
}

/// Read-only session snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: Uuid,
    pub source_lang: String,
    pub target_lang: String,
    pub voice: String,
    pub tts_enabled: bool,
    pub context_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub chunks_received: u64,
    pub last_transcript: String,
    pub last_translation: Option<String>,
    pub has_audio: bool,
}

/// Registry and orchestrator for streaming translation sessions
pub struct StreamingSessionManager {
    asr_host: Arc<AsrSessionHost>,
    translation: Arc<TranslationStage>,
    tts: Arc<TtsStage>,
    sessions: DashMap<Uuid, Arc<StreamingSession>>,
}

impl StreamingSessionManager {
    pub fn new(
        asr_host: Arc<AsrSessionHost>,
        translation: Arc<TranslationStage>,
        tts: Arc<TtsStage>,
    ) -> Self {
        Self {
            asr_host,
            translation,
            tts,
            sessions: DashMap::new(),
        }
    }

    /// Start a session. The ASR sub-session is opened first; if that
    /// fails, no session is registered.
    pub fn start(&self, config: SessionConfig, sink: Arc<dyn EventSink>) -> Result<Uuid> {
        if !is_supported_language(&config.source_lang) {
            return Err(Error::Validation(format!(
                "unsupported source language: {}",
                config.source_lang
            )));
        }
        if !is_supported_language(&config.target_lang) {
            return Err(Error::Validation(format!(
                "unsupported target language: {}",
                config.target_lang
            )));
        }

        let asr_session_id = self.asr_host.start(&config.source_lang)?;
        let id = Uuid::new_v4();
        let now = Utc::now();

        self.sessions.insert(
            id,
            Arc::new(StreamingSession {
                id,
                config,
                created_at: now,
                sink,
                state: Mutex::new(SessionState {
                    asr_session_id,
                    is_active: true,
                    chunks_received: 0,
                    last_transcript: String::new(),
                    last_translation: None,
                    last_audio: None,
                    last_activity: now,
                }),
            }),
        );
        tracing::info!(session_id = %id, "streaming session started");
        Ok(id)
    }

    /// Process one audio chunk.
    ///
    /// The session lock is held for the whole chain, so chunks of a session
    /// run in feed order. Every chunk is reported through the sink, empty
    /// text meaning the recognizer is still buffering. A final, non-blank
    /// transcript triggers translation and, when enabled, synthesis; a
    /// blank one is silence and leaves prior results untouched.
    pub async fn feed(&self, session_id: Uuid, chunk: &[u8]) -> Result<ChunkOutcome> {
        let session = self.lookup(session_id)?;
        let mut state = session.state.lock().await;
        if !state.is_active {
            return Err(Error::SessionStopped(session_id));
        }

        state.chunks_received += 1;
        state.last_activity = Utc::now();

        let partial = self.asr_host.feed(&state.asr_session_id, chunk).await?;

        if !partial.text.is_empty() {
            state.last_transcript = partial.text.clone();
        }
        Self::emit(&session, SessionEvent::Transcript {
            session_id,
            text: partial.text.clone(),
            is_final: partial.is_final,
        })
        .await;

        if partial.is_final && !is_blank(&partial.text) {
            self.translate_and_synthesize(&session, &mut state, &partial.text)
                .await;
        }

        Ok(ChunkOutcome {
            text: state.last_transcript.clone(),
            is_final: partial.is_final,
            translation: state.last_translation.clone(),
            has_audio: state.last_audio.is_some(),
        })
    }

    /// Stop a session: finalize its ASR sub-session, run the pipeline on
    /// any buffered remainder, and mark it inactive. The record is kept
    /// for later `info` queries.
    pub async fn stop(&self, session_id: Uuid) -> Result<StopSummary> {
        let session = self.lookup(session_id)?;
        let mut state = session.state.lock().await;
        if !state.is_active {
            return Err(Error::SessionStopped(session_id));
        }

        let transcript = match self.asr_host.stop(&state.asr_session_id).await {
            Ok(closed) => {
                if let Some(tail) = closed.tail.as_deref().filter(|t| !is_blank(t)) {
                    state.last_transcript = tail.to_string();
                    Self::emit(&session, SessionEvent::Transcript {
                        session_id,
                        text: tail.to_string(),
                        is_final: true,
                    })
                    .await;
                    self.translate_and_synthesize(&session, &mut state, tail)
                        .await;
                }
                closed.transcript
            }
            Err(e) => {
                // The sub-session is gone either way; fall back to what
                // the session already observed.
                tracing::warn!(session_id = %session_id, error = %e, "ASR finalization failed");
                FinalTranscript {
                    text: state.last_transcript.clone(),
                    confidence: 0.0,
                    duration: 0.0,
                }
            }
        };

        if !is_blank(&transcript.text) {
            state.last_transcript = transcript.text.clone();
        }
        state.is_active = false;
        state.last_activity = Utc::now();
        tracing::info!(session_id = %session_id, "streaming session stopped");

        Ok(StopSummary {
            session_id,
            transcript,
            translation: state.last_translation.clone(),
            has_audio: state.last_audio.is_some(),
        })
    }

    pub async fn info(&self, session_id: Uuid) -> Result<SessionInfo> {
        let session = self.lookup(session_id)?;
        Ok(Self::snapshot(&session).await)
    }

    /// Drop a session record. An active session is stopped best-effort
    /// first so its ASR sub-session does not leak.
    pub async fn remove(&self, session_id: Uuid) -> Result<()> {
        let (_, session) = self
            .sessions
            .remove(&session_id)
            .ok_or(Error::UnknownSession(session_id))?;

        let state = session.state.lock().await;
        if state.is_active {
            if let Err(e) = self.asr_host.stop(&state.asr_session_id).await {
                tracing::debug!(session_id = %session_id, error = %e, "ASR cleanup on remove failed");
            }
        }
        Ok(())
    }

    pub async fn list(&self) -> Vec<SessionInfo> {
        let sessions: Vec<Arc<StreamingSession>> = self
            .sessions
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut infos = Vec::with_capacity(sessions.len());
        for session in sessions {
            infos.push(Self::snapshot(&session).await);
        }
        infos.sort_by_key(|i| i.created_at);
        infos
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    /// Remove sessions idle past `idle_timeout`, returning how many went
    pub async fn cleanup_idle(&self, idle_timeout: Duration) -> usize {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(idle_timeout).unwrap_or(chrono::Duration::zero());

        let mut stale = Vec::new();
        for entry in self.sessions.iter() {
            let session = Arc::clone(entry.value());
            let state = session.state.lock().await;
            if state.last_activity < cutoff {
                stale.push(session.id);
            }
        }

        let mut removed = 0;
        for id in stale {
            if self.remove(id).await.is_ok() {
                tracing::info!(session_id = %id, "idle session removed");
                removed += 1;
            }
        }
        removed
    }

    /// Spawn the periodic idle-session sweep. Dropping or signalling the
    /// returned sender stops the task.
    pub fn start_cleanup_task(
        self: &Arc<Self>,
        interval: Duration,
        idle_timeout: Duration,
    ) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let manager = Arc::clone(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        manager.cleanup_idle(idle_timeout).await;
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("session cleanup task stopped");
        });
        shutdown_tx
    }

    async fn translate_and_synthesize(
        &self,
        session: &Arc<StreamingSession>,
        state: &mut SessionState,
        text: &str,
    ) {
        let config = &session.config;
        let translation = match self
            .translation
            .translate(
                text,
                &config.source_lang,
                &config.target_lang,
                config.context_id,
                config.use_cache,
            )
            .await
        {
            Ok(result) => result.value.translation,
            Err(e) => {
                tracing::warn!(session_id = %session.id, error = %e, "translation failed");
                Self::emit(session, SessionEvent::TranslationFailed {
                    session_id: session.id,
                    message: e.to_string(),
                })
                .await;
                return;
            }
        };

        state.last_translation = Some(translation.clone());
        Self::emit(session, SessionEvent::Translation {
            session_id: session.id,
            original: text.to_string(),
            translation: translation.clone(),
        })
        .await;

        if !config.tts_enabled {
            return;
        }

        match self
            .tts
            .synthesize(&translation, &config.target_lang, &config.voice, config.use_cache)
            .await
        {
            Ok(result) => {
                state.last_audio = Some(result.value.clone());
                Self::emit(session, SessionEvent::Synthesis {
                    session_id: session.id,
                    text: translation,
                    audio: result.value,
                })
                .await;
            }
            Err(e) => {
                tracing::warn!(session_id = %session.id, error = %e, "synthesis failed");
                Self::emit(session, SessionEvent::SynthesisFailed {
                    session_id: session.id,
                    message: e.to_string(),
                })
                .await;
            }
        }
    }

    async fn snapshot(session: &Arc<StreamingSession>) -> SessionInfo {
        let state = session.state.lock().await;
        SessionInfo {
            session_id: session.id,
            source_lang: session.config.source_lang.clone(),
            target_lang: session.config.target_lang.clone(),
            voice: session.config.voice.clone(),
            tts_enabled: session.config.tts_enabled,
            context_id: session.config.context_id,
            is_active: state.is_active,
            created_at: session.created_at,
            last_activity: state.last_activity,
            chunks_received: state.chunks_received,
            last_transcript: state.last_transcript.clone(),
            last_translation: state.last_translation.clone(),
            has_audio: state.last_audio.is_some(),
        }
    }

    async fn emit(session: &Arc<StreamingSession>, event: SessionEvent) {
        if let Err(e) = session.sink.emit(event).await {
            tracing::warn!(session_id = %session.id, error = %e, "event sink failed");
        }
    }

    fn lookup(&self, session_id: Uuid) -> Result<Arc<StreamingSession>> {
        self.sessions
            .get(&session_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(Error::UnknownSession(session_id))
    }
}
