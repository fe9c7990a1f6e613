use thiserror::Error;

/// Failure taxonomy for the voice pipeline.
///
/// Every variant terminates the active session (or prevents it from
/// starting); none are retried internally. The control surface reports
/// the error and the session returns to idle.
#[derive(Debug, Error)]
pub enum VoiceError {
    /// No capture device, or the device could not be opened. Fatal to
    /// session start; no transport connection is attempted.
    #[error("audio capture unavailable: {0}")]
    CaptureUnavailable(String),

    /// Transport-level failure while the stream is open.
    #[error("transport session error: {0}")]
    Session(String),

    /// Malformed inbound audio payload (bad base64, truncated PCM).
    #[error("audio decode error: {0}")]
    Decode(String),

    /// Playback device could not be opened.
    #[error("audio output unavailable: {0}")]
    PlaybackUnavailable(String),

    /// A second start was requested while a session is already open.
    #[error("a live session is already active")]
    AlreadyStreaming,
}
