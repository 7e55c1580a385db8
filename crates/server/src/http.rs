//! REST API
//!
//! Thin marshalling over the pipeline stages and registries. Handlers
//! translate the core error taxonomy into HTTP statuses and surface the
//! error message verbatim.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::json;
use speech_bridge_cache::Namespace;
use speech_bridge_config::{language_name, supported_languages};
use speech_bridge_context::chunker::chunk_text;
use speech_bridge_core::types::AsrResult;
use speech_bridge_core::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::state::AppState;
use crate::ws;

/// Error wrapper mapping the core taxonomy onto HTTP statuses
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::UnknownSession(_) | Error::UnknownAsrSession(_) | Error::UnknownContext(_) => {
                StatusCode::NOT_FOUND
            }
            Error::SessionStopped(_) => StatusCode::CONFLICT,
            Error::StageTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Error::Collaborator { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/api/languages", get(languages))
        .route("/api/voices", get(voices))
        .route("/api/translate", post(translate))
        .route("/api/translate/batch", post(translate_batch))
        .route("/api/translate/document", post(translate_document))
        .route("/api/detect", post(detect_language))
        .route("/api/asr", post(transcribe))
        .route("/api/tts", post(synthesize))
        .route("/api/tts/batch", post(synthesize_batch))
        .route("/api/contexts", post(create_context).get(list_contexts))
        .route(
            "/api/contexts/:id",
            get(context_info).put(update_context).delete(remove_context),
        )
        .route("/api/sessions", get(list_sessions))
        .route("/api/sessions/:id", get(session_info).delete(remove_session))
        .route("/api/cache/stats", get(cache_stats))
        .route("/api/cache/clear", post(cache_clear))
        .route("/ws/stream", get(ws::stream_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ready",
        "active_sessions": state.sessions.count(),
    }))
}

async fn languages() -> impl IntoResponse {
    let entries: Vec<serde_json::Value> = supported_languages()
        .into_iter()
        .map(|code| json!({ "code": code, "name": language_name(code) }))
        .collect();
    Json(json!({ "languages": entries }))
}

#[derive(Deserialize)]
struct VoicesQuery {
    language: Option<String>,
}

async fn voices(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VoicesQuery>,
) -> impl IntoResponse {
    Json(json!({ "voices": state.tts.available_voices(query.language.as_deref()) }))
}

#[derive(Deserialize)]
struct TranslateRequest {
    text: String,
    source_lang: String,
    target_lang: String,
    #[serde(default)]
    context_id: Option<Uuid>,
    #[serde(default = "default_use_cache")]
    use_cache: bool,
}

fn default_use_cache() -> bool {
    true
}

#[derive(Serialize)]
struct TranslateResponse {
    original: String,
    translation: String,
    source_lang: String,
    target_lang: String,
    cached: bool,
}

async fn translate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TranslateRequest>,
) -> Result<Json<TranslateResponse>, ApiError> {
    metrics::counter!("speech_bridge_requests_total", "endpoint" => "translate").increment(1);
    let result = state
        .translation
        .translate(
            &req.text,
            &req.source_lang,
            &req.target_lang,
            req.context_id,
            req.use_cache,
        )
        .await?;
    if result.cached {
        metrics::counter!("speech_bridge_cache_hits_total", "stage" => "translation").increment(1);
    }
    Ok(Json(TranslateResponse {
        original: result.value.original,
        translation: result.value.translation,
        source_lang: result.value.source_lang,
        target_lang: result.value.target_lang,
        cached: result.cached,
    }))
}

#[derive(Deserialize)]
struct BatchTranslateRequest {
    items: Vec<String>,
    source_lang: String,
    target_lang: String,
    #[serde(default)]
    context_id: Option<Uuid>,
    #[serde(default = "default_use_cache")]
    use_cache: bool,
}

async fn translate_batch(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BatchTranslateRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    metrics::counter!("speech_bridge_requests_total", "endpoint" => "translate_batch").increment(1);
    if req.items.is_empty() {
        return Err(Error::validation("items must not be empty").into());
    }

    let results = state
        .translation
        .translate_batch(
            &req.items,
            &req.source_lang,
            &req.target_lang,
            req.context_id,
            req.use_cache,
        )
        .await;

    let results: Vec<serde_json::Value> = results
        .into_iter()
        .map(|item| match item {
            Ok(r) => json!({
                "success": true,
                "original": r.value.original,
                "translation": r.value.translation,
                "cached": r.cached,
            }),
            Err(e) => json!({ "success": false, "error": e.to_string() }),
        })
        .collect();
    Ok(Json(json!({ "results": results })))
}

#[derive(Deserialize)]
struct DocumentTranslateRequest {
    text: String,
    source_lang: String,
    target_lang: String,
    #[serde(default)]
    context_id: Option<Uuid>,
    #[serde(default = "default_use_cache")]
    use_cache: bool,
}

/// Translate a whole document: split into word windows, translate each,
/// rejoin. Any failed window fails the request.
async fn translate_document(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DocumentTranslateRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    metrics::counter!("speech_bridge_requests_total", "endpoint" => "translate_document")
        .increment(1);
    let chunks = chunk_text(&req.text, state.settings.context.chunk_words, 0);
    if chunks.is_empty() {
        return Err(Error::validation("document is empty").into());
    }

    let results = state
        .translation
        .translate_batch(
            &chunks,
            &req.source_lang,
            &req.target_lang,
            req.context_id,
            req.use_cache,
        )
        .await;

    let mut parts = Vec::with_capacity(results.len());
    for item in results {
        parts.push(item?.value.translation);
    }
    Ok(Json(json!({
        "translation": parts.join(" "),
        "chunks": parts.len(),
        "source_lang": req.source_lang,
        "target_lang": req.target_lang,
    })))
}

#[derive(Deserialize)]
struct DetectRequest {
    text: String,
}

async fn detect_language(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DetectRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (language, confidence) = state.translation.detect_language(&req.text).await?;
    Ok(Json(json!({ "language": language, "confidence": confidence })))
}

#[derive(Deserialize)]
struct AsrRequest {
    /// base64-encoded WAV or raw PCM16LE
    audio: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default = "default_use_cache")]
    use_cache: bool,
}

#[derive(Serialize)]
struct AsrResponse {
    #[serde(flatten)]
    result: AsrResult,
    cached: bool,
}

async fn transcribe(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AsrRequest>,
) -> Result<Json<AsrResponse>, ApiError> {
    metrics::counter!("speech_bridge_requests_total", "endpoint" => "asr").increment(1);
    let audio = BASE64
        .decode(&req.audio)
        .map_err(|e| Error::Validation(format!("audio is not valid base64: {}", e)))?;
    let language = req
        .language
        .unwrap_or_else(|| state.settings.asr.default_language.clone());

    let result = state.asr.transcribe(&audio, &language, req.use_cache).await?;
    Ok(Json(AsrResponse {
        result: result.value,
        cached: result.cached,
    }))
}

#[derive(Deserialize)]
struct TtsRequest {
    text: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    voice: Option<String>,
    #[serde(default = "default_use_cache")]
    use_cache: bool,
}

async fn synthesize(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TtsRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    metrics::counter!("speech_bridge_requests_total", "endpoint" => "tts").increment(1);
    let language = req
        .language
        .unwrap_or_else(|| state.settings.translation.default_target.clone());
    let voice = req
        .voice
        .unwrap_or_else(|| state.settings.tts.default_voice.clone());

    let result = state
        .tts
        .synthesize(&req.text, &language, &voice, req.use_cache)
        .await?;
    Ok(Json(json!({
        "audio": BASE64.encode(&result.value.bytes),
        "format": result.value.format,
        "sample_rate": result.value.sample_rate,
        "cached": result.cached,
    })))
}

#[derive(Deserialize)]
struct BatchTtsRequest {
    texts: Vec<String>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    voice: Option<String>,
    #[serde(default = "default_use_cache")]
    use_cache: bool,
}

async fn synthesize_batch(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BatchTtsRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    metrics::counter!("speech_bridge_requests_total", "endpoint" => "tts_batch").increment(1);
    if req.texts.is_empty() {
        return Err(Error::validation("texts must not be empty").into());
    }
    let language = req
        .language
        .unwrap_or_else(|| state.settings.translation.default_target.clone());
    let voice = req
        .voice
        .unwrap_or_else(|| state.settings.tts.default_voice.clone());

    let mut results = Vec::with_capacity(req.texts.len());
    for text in &req.texts {
        match state.tts.synthesize(text, &language, &voice, req.use_cache).await {
            Ok(r) => results.push(json!({
                "success": true,
                "audio": BASE64.encode(&r.value.bytes),
                "format": r.value.format,
                "sample_rate": r.value.sample_rate,
                "cached": r.cached,
            })),
            Err(e) => results.push(json!({ "success": false, "error": e.to_string() })),
        }
    }
    let success_count = results.iter().filter(|r| r["success"] == true).count();
    Ok(Json(json!({
        "results": results,
        "count": results.len(),
        "success_count": success_count,
    })))
}

#[derive(Deserialize)]
struct CreateContextRequest {
    name: String,
    #[serde(default)]
    language: String,
    text: String,
}

async fn create_context(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateContextRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let context_id = state
        .contexts
        .load_text(&req.name, &req.language, &req.text)?;
    Ok(Json(json!({ "context_id": context_id })))
}

async fn list_contexts(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({ "contexts": state.contexts.list() }))
}

async fn context_info(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let info = state.contexts.info(id)?;
    Ok(Json(serde_json::to_value(info).map_err(Error::from)?))
}

#[derive(Deserialize)]
struct UpdateContextRequest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    language: Option<String>,
    text: String,
}

async fn update_context(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateContextRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .contexts
        .update(id, req.name.as_deref(), req.language.as_deref(), &req.text)?;
    let info = state.contexts.info(id)?;
    Ok(Json(serde_json::to_value(info).map_err(Error::from)?))
}

async fn remove_context(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.contexts.remove(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_sessions(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({ "sessions": state.sessions.list().await }))
}

async fn session_info(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let info = state.sessions.info(id).await?;
    Ok(Json(serde_json::to_value(info).map_err(Error::from)?))
}

async fn remove_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.sessions.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn cache_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.cache.snapshot())
}

#[derive(Deserialize)]
struct CacheClearRequest {
    #[serde(default)]
    namespace: Option<Namespace>,
}

async fn cache_clear(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CacheClearRequest>,
) -> impl IntoResponse {
    state.cache.clear(req.namespace);
    Json(json!({ "cleared": true }))
}
