use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use std::sync::Arc;

use super::{validate::validate, HealthResponse, VoicesResponse, SUPPORTED_FORMAT};
use crate::api::routes::AppState;
use crate::error::AppError;
use crate::tts::{TempAudio, TempAudioStream, DOWNLOAD_NAME};

const AUDIO_WAV: &str = "audio/wav";

async fn synthesize_validated(
    state: &AppState,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<TempAudio, AppError> {
    let Json(body) = payload?;
    let request = validate(&body, &state.config)?;
    state.tts.synthesize(&request.text, &request.voice).await
}

/// Returns the clip as a download; the temp file lives until the body stream is dropped.
pub async fn synthesize(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let audio = synthesize_validated(&state, payload).await?;
    let (stream, len) = TempAudioStream::open(audio).await?;

    let disposition = format!("attachment; filename=\"{}\"", DOWNLOAD_NAME);
    let disposition = HeaderValue::from_str(&disposition)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(AUDIO_WAV)),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CONTENT_LENGTH, HeaderValue::from(len)),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}

/// Returns the raw clip bytes; the temp file is removed before the response is built.
pub async fn synthesize_stream(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let audio = synthesize_validated(&state, payload).await?;
    let wav = tokio::fs::read(audio.path()).await?;
    drop(audio);

    let disposition = format!("inline; filename=\"{}\"", DOWNLOAD_NAME);
    let disposition = HeaderValue::from_str(&disposition)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(AUDIO_WAV)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        wav,
    )
        .into_response())
}

pub async fn list_voices(State(state): State<Arc<AppState>>) -> Json<VoicesResponse> {
    Json(VoicesResponse {
        voices: state.config.allowed_voices.clone(),
        default: state.config.default_voice.clone(),
        supported_format: SUPPORTED_FORMAT,
    })
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "Kokoro TTS API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        supported_format: SUPPORTED_FORMAT,
    })
}

pub async fn not_found() -> AppError {
    AppError::NotFound
}

pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
