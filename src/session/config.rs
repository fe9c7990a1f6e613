use serde::{Deserialize, Serialize};

use crate::audio::codec;
use crate::audio::{CaptureSource, PlaybackTarget};

/// Configuration for a live session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Unique session identifier (e.g., "voice-2f1a...")
    pub session_id: String,

    /// Where microphone audio comes from
    pub capture_source: CaptureSource,

    /// Where synthesized audio goes
    pub playback_target: PlaybackTarget,

    /// Capture sample rate (the inference service expects 16kHz)
    pub capture_sample_rate: u32,

    /// Playback sample rate (the service emits 24kHz)
    pub playback_sample_rate: u32,

    /// Number of audio channels (1 = mono)
    pub channels: u16,

    /// Samples per outbound transport frame
    pub frame_size: usize,

    /// Transport server URL
    pub transport_url: String,

    /// Auth token for the transport, if required
    pub auth_token: Option<String>,

    /// Prebuilt voice identity requested at setup
    pub voice_name: String,

    /// System instruction sent at setup
    pub system_instruction: String,

    /// Directory for an optional WAV capture of the synthesized output
    pub recordings_path: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("voice-{}", uuid::Uuid::new_v4()),
            capture_source: CaptureSource::Microphone,
            playback_target: PlaybackTarget::Device,
            capture_sample_rate: codec::CAPTURE_SAMPLE_RATE,
            playback_sample_rate: codec::PLAYBACK_SAMPLE_RATE,
            channels: 1, // Mono
            frame_size: 4096,
            transport_url: "nats://localhost:4222".to_string(),
            auth_token: None,
            voice_name: "Zephyr".to_string(),
            system_instruction:
                "You are a live voice assistant. Engage in professional, low-latency vocal reasoning."
                    .to_string(),
            recordings_path: None,
        }
    }
}
