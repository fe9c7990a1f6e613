use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::SessionState;

/// Who produced a transcript fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    /// The caller (microphone side)
    User,
    /// The synthesized voice
    Model,
}

/// A single transcription fragment from the live stream.
///
/// Entries are appended in arrival order and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub speaker: Speaker,

    /// Transcribed text fragment
    pub text: String,

    /// When this fragment was received
    pub received_at: DateTime<Utc>,
}

/// Statistics about a live session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// Current lifecycle state
    pub state: SessionState,

    /// When the session was created
    pub started_at: DateTime<Utc>,

    /// Total duration in seconds
    pub duration_secs: f64,

    /// Outbound audio frames published so far
    pub frames_sent: usize,

    /// Inbound audio chunks scheduled for playback
    pub chunks_scheduled: usize,

    /// Transcript fragments received
    pub transcript_entries: usize,
}
