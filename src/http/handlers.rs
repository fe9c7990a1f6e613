use super::state::AppState;
use crate::error::VoiceError;
use crate::session::{LiveSession, SessionConfig, SessionState, SessionStats, TranscriptEntry};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    /// Optional session ID (if not provided, generate UUID)
    pub session_id: Option<String>,

    /// Optional voice identity override
    pub voice_name: Option<String>,

    /// Optional system instruction override
    pub system_instruction: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub session_id: String,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct StopSessionResponse {
    pub session_id: String,
    pub status: String,
    pub stats: SessionStats,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /voice/session/start
/// Start a new live session
pub async fn start_session(
    State(state): State<AppState>,
    Json(req): Json<StartSessionRequest>,
) -> impl IntoResponse {
    let session_id = req
        .session_id
        .unwrap_or_else(|| format!("voice-{}", uuid::Uuid::new_v4()));

    info!("Starting live session: {}", session_id);

    // Only one session at a time; an idle leftover is replaced.
    {
        let current = state.session.read().await;
        if let Some(session) = current.as_ref() {
            if session.state() != SessionState::Idle {
                return (
                    StatusCode::CONFLICT,
                    Json(ErrorResponse {
                        error: format!(
                            "Session {} is already active",
                            session.session_id()
                        ),
                    }),
                )
                    .into_response();
            }
        }
    }

    let config = SessionConfig {
        session_id: session_id.clone(),
        voice_name: req
            .voice_name
            .unwrap_or_else(|| state.defaults.voice_name.clone()),
        system_instruction: req
            .system_instruction
            .unwrap_or_else(|| state.defaults.system_instruction.clone()),
        ..(*state.defaults).clone()
    };

    let session = Arc::new(LiveSession::new(config));

    if let Err(e) = session.start().await {
        error!("Failed to start session: {}", e);
        let status = match e {
            VoiceError::CaptureUnavailable(_) | VoiceError::PlaybackUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            VoiceError::AlreadyStreaming => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        return (
            status,
            Json(ErrorResponse {
                error: format!("Failed to start session: {}", e),
            }),
        )
            .into_response();
    }

    {
        let mut current = state.session.write().await;
        *current = Some(session);
    }

    info!("Live session started: {}", session_id);

    (
        StatusCode::OK,
        Json(StartSessionResponse {
            session_id: session_id.clone(),
            status: "streaming".to_string(),
            message: format!("Live session {} started", session_id),
        }),
    )
        .into_response()
}

/// POST /voice/session/stop
/// Stop the active live session
pub async fn stop_session(State(state): State<AppState>) -> impl IntoResponse {
    let session = {
        let mut current = state.session.write().await;
        current.take()
    };

    match session {
        Some(session) => match session.stop().await {
            Ok(stats) => {
                info!("Live session stopped: {}", session.session_id());
                (
                    StatusCode::OK,
                    Json(StopSessionResponse {
                        session_id: session.session_id().to_string(),
                        status: "stopped".to_string(),
                        stats,
                    }),
                )
                    .into_response()
            }
            Err(e) => {
                error!("Failed to stop session: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: format!("Failed to stop session: {}", e),
                    }),
                )
                    .into_response()
            }
        },
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "No active session".to_string(),
            }),
        )
            .into_response(),
    }
}

/// GET /voice/session/status
/// Get status of the active session
pub async fn get_session_status(State(state): State<AppState>) -> impl IntoResponse {
    let current = state.session.read().await;

    match current.as_ref() {
        Some(session) => {
            let stats = session.stats().await;
            (StatusCode::OK, Json(stats)).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "No active session".to_string(),
            }),
        )
            .into_response(),
    }
}

/// GET /voice/session/transcript
/// Get the transcript accumulated so far
pub async fn get_session_transcript(State(state): State<AppState>) -> impl IntoResponse {
    let current = state.session.read().await;

    match current.as_ref() {
        Some(session) => {
            let transcript: Vec<TranscriptEntry> = session.transcript().await;
            (StatusCode::OK, Json(transcript)).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "No active session".to_string(),
            }),
        )
            .into_response(),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
