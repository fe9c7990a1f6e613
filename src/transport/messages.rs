use serde::{Deserialize, Serialize};

/// Session setup published once when the stream opens.
///
/// Negotiates audio-only responses, the synthesized voice identity, and
/// transcription for both directions.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionSetupMessage {
    pub session_id: String,
    pub response_modality: String, // "audio"
    pub voice_name: String,
    pub system_instruction: String,
    pub input_transcription: bool,
    pub output_transcription: bool,
    pub input_sample_rate: u32,
    pub output_sample_rate: u32,
}

/// Outbound audio frame published to the inference service
#[derive(Debug, Serialize, Deserialize)]
pub struct AudioFrameMessage {
    pub session_id: String,
    pub sequence: u32,
    pub pcm: String, // Base64-encoded PCM bytes
    pub sample_rate: u32,
    pub channels: u16,
    pub timestamp: String, // RFC3339 timestamp
    #[serde(rename = "final")]
    pub final_frame: bool,
}

/// Event received from the inference service
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEventMessage {
    /// Synthesized audio chunk (base64 16-bit PCM)
    AudioChunk {
        session_id: String,
        pcm: String,
        sample_rate: u32,
        channels: u16,
    },
    /// Transcription of the caller's speech
    InputTranscript { session_id: String, text: String },
    /// Transcription of the model's speech
    OutputTranscript { session_id: String, text: String },
    /// The caller started speaking while synthesized audio was playing
    Interrupted { session_id: String },
    /// The model finished a response turn
    TurnComplete { session_id: String },
    /// The service closed the stream
    Closed { session_id: String },
    /// Server-side failure; the stream is dead
    Error { session_id: String, message: String },
}

impl ServerEventMessage {
    pub fn session_id(&self) -> &str {
        match self {
            Self::AudioChunk { session_id, .. }
            | Self::InputTranscript { session_id, .. }
            | Self::OutputTranscript { session_id, .. }
            | Self::Interrupted { session_id }
            | Self::TurnComplete { session_id }
            | Self::Closed { session_id }
            | Self::Error { session_id, .. } => session_id,
        }
    }
}
