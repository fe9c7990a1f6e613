pub mod audio;
pub mod config;
pub mod error;
pub mod http;
pub mod session;
pub mod transport;

pub use audio::{
    AudioChunk, AudioSink, CaptureBackend, CaptureBackendFactory, CaptureConfig, CaptureFrame,
    CaptureSource, DeviceSink, DiscardSink, OutputRecorder, PlaybackScheduler, PlaybackTarget,
};
pub use config::Config;
pub use error::VoiceError;
pub use http::{create_router, AppState};
pub use session::{
    LiveSession, SessionConfig, SessionState, SessionStats, Speaker, TranscriptEntry,
};
pub use transport::{ServerEvent, SessionSetupMessage, TransportClient};
