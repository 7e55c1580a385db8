//! Streaming WebSocket endpoint
//!
//! One streaming session per connection. JSON frames carry control and
//! base64 audio; raw binary frames are treated as PCM chunks. Outbound
//! traffic goes through an mpsc channel so pipeline events and direct
//! replies share one ordered writer.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use speech_bridge_pipeline::SessionConfig;
use speech_bridge_transport::{ChannelSink, ClientMessage, ServerMessage};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::state::AppState;

pub async fn stream_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(64);

    let sender_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let frame = match serde_json::to_string(&message) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::error!(error = %e, "failed to serialize outbound frame");
                    continue;
                }
            };
            if ws_tx.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
    });

    let mut session_id: Option<Uuid> = None;

    while let Some(frame) = ws_rx.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(error = %e, "websocket receive error");
                break;
            }
        };

        match frame {
            Message::Text(text) => {
                let message: ClientMessage = match serde_json::from_str(&text) {
                    Ok(message) => message,
                    Err(e) => {
                        let _ = tx
                            .send(ServerMessage::error(format!("invalid frame: {}", e)))
                            .await;
                        continue;
                    }
                };
                if !handle_message(message, &state, &tx, &mut session_id).await {
                    break;
                }
            }
            Message::Binary(chunk) => {
                feed_chunk(&state, &tx, session_id, &chunk).await;
            }
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }

    // Client went away with the session still running
    if let Some(id) = session_id {
        if let Err(e) = state.sessions.stop(id).await {
            tracing::debug!(session_id = %id, error = %e, "cleanup stop after disconnect");
        }
    }
    sender_task.abort();
}

/// Returns false when the connection should close
async fn handle_message(
    message: ClientMessage,
    state: &Arc<AppState>,
    tx: &mpsc::Sender<ServerMessage>,
    session_id: &mut Option<Uuid>,
) -> bool {
    match message {
        ClientMessage::Start {
            source_lang,
            target_lang,
            context_id,
            tts_enabled,
            voice,
        } => {
            if session_id.is_some() {
                let _ = tx
                    .send(ServerMessage::error("session already started"))
                    .await;
                return true;
            }

            let config = SessionConfig {
                source_lang,
                target_lang,
                context_id,
                tts_enabled: tts_enabled.unwrap_or(true),
                voice: voice.unwrap_or_else(|| state.settings.tts.default_voice.clone()),
                use_cache: true,
            };
            let sink = Arc::new(ChannelSink::new(tx.clone()));
            match state.sessions.start(config, sink) {
                Ok(id) => {
                    metrics::counter!("speech_bridge_sessions_started_total").increment(1);
                    *session_id = Some(id);
                    let _ = tx.send(ServerMessage::Started { session_id: id }).await;
                }
                Err(e) => {
                    let _ = tx.send(ServerMessage::error(e.to_string())).await;
                }
            }
            true
        }
        ClientMessage::Audio { data } => {
            match ClientMessage::decode_audio(&data) {
                Ok(chunk) => feed_chunk(state, tx, *session_id, &chunk).await,
                Err(e) => {
                    let _ = tx
                        .send(ServerMessage::error(format!("audio is not valid base64: {}", e)))
                        .await;
                }
            }
            true
        }
        ClientMessage::Stop => {
            let Some(id) = session_id.take() else {
                let _ = tx.send(ServerMessage::error("no active session")).await;
                return true;
            };
            match state.sessions.stop(id).await {
                Ok(summary) => {
                    let _ = tx
                        .send(ServerMessage::Stopped {
                            session_id: id,
                            transcript: summary.transcript,
                            translation: summary.translation,
                        })
                        .await;
                }
                Err(e) => {
                    let _ = tx.send(ServerMessage::error(e.to_string())).await;
                }
            }
            true
        }
        ClientMessage::Info => {
            let Some(id) = *session_id else {
                let _ = tx.send(ServerMessage::error("no active session")).await;
                return true;
            };
            match state.sessions.info(id).await {
                Ok(info) => {
                    let _ = tx.send(ServerMessage::Session { info }).await;
                }
                Err(e) => {
                    let _ = tx.send(ServerMessage::error(e.to_string())).await;
                }
            }
            true
        }
    }
}

async fn feed_chunk(
    state: &Arc<AppState>,
    tx: &mpsc::Sender<ServerMessage>,
    session_id: Option<Uuid>,
    chunk: &[u8],
) {
    let Some(id) = session_id else {
        let _ = tx
            .send(ServerMessage::error("send a start frame before audio"))
            .await;
        return;
    };
    // Incremental results reach the client through the session's sink;
    // only failures need a direct reply.
    if let Err(e) = state.sessions.feed(id, chunk).await {
        let _ = tx.send(ServerMessage::error(e.to_string())).await;
    }
}
