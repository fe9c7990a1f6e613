// Integration tests for the live session lifecycle
//
// These tests cover the state machine and failure paths that need no
// running transport server. The full streaming loop (capture -> NATS ->
// playback) requires a NATS server and is exercised by the ignored test
// at the bottom.

use voxlink::session::{LiveSession, SessionConfig, SessionState, StateCell};
use voxlink::{CaptureSource, PlaybackTarget, VoiceError};

fn test_config() -> SessionConfig {
    SessionConfig {
        session_id: "test-session".to_string(),
        capture_source: CaptureSource::File("/nonexistent/missing.wav".to_string()),
        playback_target: PlaybackTarget::Discard,
        ..SessionConfig::default()
    }
}

#[tokio::test]
async fn test_stop_without_start_is_a_no_op() {
    let session = LiveSession::new(test_config());

    let stats = session.stop().await.unwrap();

    assert_eq!(session.state(), SessionState::Idle);
    assert_eq!(stats.state, SessionState::Idle);
    assert_eq!(stats.frames_sent, 0);
}

#[tokio::test]
async fn test_stop_twice_is_idempotent() {
    let session = LiveSession::new(test_config());

    session.stop().await.unwrap();
    let stats = session.stop().await.unwrap();

    // No error, no state change
    assert_eq!(session.state(), SessionState::Idle);
    assert_eq!(stats.state, SessionState::Idle);
}

#[tokio::test]
async fn test_capture_unavailable_leaves_session_idle() {
    // The capture source opens before any transport connection is
    // attempted, so a missing file fails the start without dialing the
    // (unreachable) transport URL.
    let config = SessionConfig {
        transport_url: "nats://127.0.0.1:1".to_string(),
        ..test_config()
    };
    let session = LiveSession::new(config);

    let result = session.start().await;

    assert!(matches!(result, Err(VoiceError::CaptureUnavailable(_))));
    assert_eq!(session.state(), SessionState::Idle);

    let stats = session.stats().await;
    assert_eq!(stats.frames_sent, 0);
    assert_eq!(stats.chunks_scheduled, 0);
}

#[tokio::test]
async fn test_failed_start_can_be_retried() {
    let session = LiveSession::new(test_config());

    let first = session.start().await;
    assert!(matches!(first, Err(VoiceError::CaptureUnavailable(_))));

    // The failed start returned the session to idle, so a retry reaches
    // the capture open again instead of being rejected as a double start.
    let second = session.start().await;
    assert!(matches!(second, Err(VoiceError::CaptureUnavailable(_))));
    assert_eq!(session.state(), SessionState::Idle);
}

#[test]
fn test_state_cell_guards_double_start() {
    let cell = StateCell::new(SessionState::Idle);

    assert!(cell.transition(SessionState::Idle, SessionState::Starting));
    assert!(
        !cell.transition(SessionState::Idle, SessionState::Starting),
        "Second start must not win the transition"
    );
    assert_eq!(cell.get(), SessionState::Starting);
}

#[test]
fn test_state_serializes_lowercase() {
    assert_eq!(
        serde_json::to_string(&SessionState::Streaming).unwrap(),
        "\"streaming\""
    );
    assert_eq!(serde_json::to_string(&SessionState::Idle).unwrap(), "\"idle\"");
}

#[tokio::test]
async fn test_transcript_starts_empty() {
    let session = LiveSession::new(test_config());

    let transcript = session.transcript().await;
    assert!(transcript.is_empty());
}

// Requires a NATS server: docker run -p 4222:4222 nats
#[tokio::test]
#[ignore]
async fn test_streaming_session_rejects_second_start() {
    let dir = tempfile::TempDir::new().unwrap();
    let wav_path = dir.path().join("input.wav");

    // One second of silence at the capture rate
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&wav_path, spec).unwrap();
    for _ in 0..16000 {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();

    let config = SessionConfig {
        session_id: "double-start-test".to_string(),
        capture_source: CaptureSource::File(wav_path.to_string_lossy().to_string()),
        playback_target: PlaybackTarget::Discard,
        ..SessionConfig::default()
    };
    let session = LiveSession::new(config);

    session.start().await.unwrap();
    assert_eq!(session.state(), SessionState::Streaming);

    let second = session.start().await;
    assert!(matches!(second, Err(VoiceError::AlreadyStreaming)));
    assert_eq!(session.state(), SessionState::Streaming);

    let stats = session.stop().await.unwrap();
    assert_eq!(stats.state, SessionState::Idle);
    assert_eq!(session.state(), SessionState::Idle);
}
