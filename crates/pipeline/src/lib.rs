//! Pipeline stages and streaming session orchestration
//!
//! The stages wrap the expensive collaborator calls with validation,
//! caching, and timeouts. The streaming session manager drives the
//! ASR -> translation -> TTS chain over incrementally fed audio chunks,
//! serialized per session, and reports through an event sink.

pub mod asr_stream;
pub mod engines;
pub mod events;
pub mod stages;
pub mod streaming;

pub use asr_stream::{AsrSessionHost, ClosedAsrSession};
pub use engines::{NoopTranslator, SilenceSynthesizer, StubRecognizer};
pub use events::{EventSink, NullSink, SessionEvent};
pub use stages::{AsrStage, StageResult, TranslationStage, TtsStage};
pub use streaming::{
    ChunkOutcome, SessionConfig, SessionInfo, StopSummary, StreamingSessionManager,
};
