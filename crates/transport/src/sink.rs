//! Event-sink bridge onto an outbound message channel

use speech_bridge_core::{Error, Result};
use speech_bridge_pipeline::{EventSink, SessionEvent};
use tokio::sync::mpsc;

use crate::messages::ServerMessage;

/// Forwards session events as `ServerMessage` frames over an mpsc channel.
/// The WebSocket handler drains the receiving end.
pub struct ChannelSink {
    tx: mpsc::Sender<ServerMessage>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<ServerMessage>) -> Self {
        Self { tx }
    }
}

#[async_trait::async_trait]
impl EventSink for ChannelSink {
    async fn emit(&self, event: SessionEvent) -> Result<()> {
        let message = match event {
            SessionEvent::Transcript { text, is_final, .. } => {
                ServerMessage::Transcript { text, is_final }
            }
            SessionEvent::Translation {
                original,
                translation,
                ..
            } => ServerMessage::Translation {
                original,
                translation,
            },
            SessionEvent::TranslationFailed { message, .. } => {
                ServerMessage::TranslationError { message }
            }
            SessionEvent::Synthesis { text, audio, .. } => ServerMessage::audio(&audio, &text),
            SessionEvent::SynthesisFailed { message, .. } => {
                ServerMessage::SynthesisError { message }
            }
        };

        self.tx
            .send(message)
            .await
            .map_err(|_| Error::Other("client connection closed".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speech_bridge_core::types::AudioBlob;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_events_map_to_frames() {
        let (tx, mut rx) = mpsc::channel(4);
        let sink = ChannelSink::new(tx);
        let id = Uuid::new_v4();

        sink.emit(SessionEvent::Transcript {
            session_id: id,
            text: "xin chào".to_string(),
            is_final: true,
        })
        .await
        .unwrap();
        sink.emit(SessionEvent::Synthesis {
            session_id: id,
            text: "hello".to_string(),
            audio: AudioBlob::wav(vec![1], 16_000),
        })
        .await
        .unwrap();

        assert!(matches!(rx.recv().await.unwrap(), ServerMessage::Transcript { .. }));
        assert!(matches!(rx.recv().await.unwrap(), ServerMessage::Audio { .. }));
    }

    #[tokio::test]
    async fn test_closed_channel_is_an_error() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sink = ChannelSink::new(tx);
        let result = sink
            .emit(SessionEvent::TranslationFailed {
                session_id: Uuid::new_v4(),
                message: "x".to_string(),
            })
            .await;
        assert!(result.is_err());
    }
}
