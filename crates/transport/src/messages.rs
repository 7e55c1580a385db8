//! Streaming wire messages
//!
//! JSON frames tagged by `type`. Audio payloads are base64 inside JSON;
//! clients may also send raw binary WebSocket frames, which the server
//! treats as PCM chunks without the JSON envelope.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use speech_bridge_core::types::{AudioBlob, FinalTranscript};
use speech_bridge_pipeline::SessionInfo;
use uuid::Uuid;

/// Frames the client sends over `/ws/stream`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Start {
        source_lang: String,
        target_lang: String,
        #[serde(default)]
        context_id: Option<Uuid>,
        #[serde(default)]
        tts_enabled: Option<bool>,
        #[serde(default)]
        voice: Option<String>,
    },
    Audio {
        /// base64-encoded PCM16LE chunk
        data: String,
    },
    Stop,
    Info,
}

impl ClientMessage {
    /// Decode the audio payload of an `Audio` frame
    pub fn decode_audio(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
        BASE64.decode(data)
    }
}

/// Frames the server sends back
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Started {
        session_id: Uuid,
    },
    Transcript {
        text: String,
        is_final: bool,
    },
    Translation {
        original: String,
        translation: String,
    },
    TranslationError {
        message: String,
    },
    Audio {
        /// base64-encoded audio container
        data: String,
        format: String,
        sample_rate: u32,
        text: String,
    },
    SynthesisError {
        message: String,
    },
    Stopped {
        session_id: Uuid,
        transcript: FinalTranscript,
        translation: Option<String>,
    },
    Session {
        info: SessionInfo,
    },
    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn audio(blob: &AudioBlob, text: &str) -> Self {
        ServerMessage::Audio {
            data: BASE64.encode(&blob.bytes),
            format: blob.format.clone(),
            sample_rate: blob.sample_rate,
            text: text.to_string(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_start_roundtrip() {
        let json = r#"{"type":"start","source_lang":"vi","target_lang":"en"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::Start {
                source_lang,
                target_lang,
                context_id,
                tts_enabled,
                voice,
            } => {
                assert_eq!(source_lang, "vi");
                assert_eq!(target_lang, "en");
                assert!(context_id.is_none());
                assert!(tts_enabled.is_none());
                assert!(voice.is_none());
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_audio_payload_base64() {
        let raw = vec![1u8, 2, 3, 4];
        let frame = serde_json::json!({ "type": "audio", "data": BASE64.encode(&raw) });
        let msg: ClientMessage = serde_json::from_value(frame).unwrap();
        match msg {
            ClientMessage::Audio { data } => {
                assert_eq!(ClientMessage::decode_audio(&data).unwrap(), raw);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_server_audio_frame_shape() {
        let blob = AudioBlob::wav(vec![9, 9, 9], 16_000);
        let frame = serde_json::to_value(ServerMessage::audio(&blob, "hello")).unwrap();
        assert_eq!(frame["type"], "audio");
        assert_eq!(frame["format"], "wav");
        assert_eq!(frame["sample_rate"], 16_000);
        assert_eq!(BASE64.decode(frame["data"].as_str().unwrap()).unwrap(), blob.bytes);
    }

    #[test]
    fn test_server_error_tag() {
        let frame = serde_json::to_value(ServerMessage::error("bad frame")).unwrap();
        assert_eq!(frame["type"], "error");
        assert_eq!(frame["message"], "bad frame");
    }
}
