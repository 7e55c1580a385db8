//! Session event sink
//!
//! Incremental results flow to the transport through a sink trait rather
//! than a raw callback, so ordering and failure isolation are stated once.
//! Sink failures are logged by the caller and never abort chunk processing.

use serde::{Deserialize, Serialize};
use speech_bridge_core::types::AudioBlob;
use speech_bridge_core::Result;
use uuid::Uuid;

/// Tagged incremental results emitted while a session runs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    Transcript {
        session_id: Uuid,
        text: String,
        is_final: bool,
    },
    Translation {
        session_id: Uuid,
        original: String,
        translation: String,
    },
    TranslationFailed {
        session_id: Uuid,
        message: String,
    },
    Synthesis {
        session_id: Uuid,
        text: String,
        audio: AudioBlob,
    },
    SynthesisFailed {
        session_id: Uuid,
        message: String,
    },
}

/// Destination for session events, usually a transport connection
#[async_trait::async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: SessionEvent) -> Result<()>;
}

/// Sink that discards everything, for headless callers
pub struct NullSink;

#[async_trait::async_trait]
impl EventSink for NullSink {
    async fn emit(&self, _event: SessionEvent) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = SessionEvent::Transcript {
            session_id: Uuid::nil(),
            text: "xin chào".to_string(),
            is_final: true,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "transcript");
        assert_eq!(json["is_final"], true);
    }
}
