use base64::Engine;
use voxlink::transport::{AudioFrameMessage, ServerEventMessage, SessionSetupMessage};

#[test]
fn test_audio_frame_serialization() {
    let msg = AudioFrameMessage {
        session_id: "test-session".to_string(),
        sequence: 0,
        pcm: base64::engine::general_purpose::STANDARD.encode([0u8; 100]),
        sample_rate: 16000,
        channels: 1,
        timestamp: "2026-08-05T14:30:00Z".to_string(),
        final_frame: false,
    };

    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("test-session"));
    assert!(json.contains("16000"));
    assert!(json.contains("\"final\":false"));
    assert!(json.contains("\"sequence\":0"));

    let deserialized: AudioFrameMessage = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized.session_id, "test-session");
    assert_eq!(deserialized.sample_rate, 16000);
    assert_eq!(deserialized.channels, 1);
    assert!(!deserialized.final_frame);
}

#[test]
fn test_audio_frame_final_marker() {
    let msg = AudioFrameMessage {
        session_id: "test-session".to_string(),
        sequence: 10,
        pcm: String::new(), // Empty for final marker
        sample_rate: 16000,
        channels: 1,
        timestamp: "2026-08-05T14:30:00Z".to_string(),
        final_frame: true,
    };

    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("\"final\":true"));

    let deserialized: AudioFrameMessage = serde_json::from_str(&json).unwrap();
    assert!(deserialized.final_frame);
    assert!(deserialized.pcm.is_empty());
    assert_eq!(deserialized.sequence, 10);
}

#[test]
fn test_server_event_audio_chunk_deserialization() {
    let json = r#"{
        "type": "audio_chunk",
        "session_id": "test-session",
        "pcm": "AAA=",
        "sample_rate": 24000,
        "channels": 1
    }"#;

    let msg: ServerEventMessage = serde_json::from_str(json).unwrap();
    assert_eq!(msg.session_id(), "test-session");
    assert!(matches!(
        msg,
        ServerEventMessage::AudioChunk { sample_rate: 24000, channels: 1, .. }
    ));
}

#[test]
fn test_server_event_transcripts_deserialization() {
    let input: ServerEventMessage = serde_json::from_str(
        r#"{"type": "input_transcript", "session_id": "s", "text": "hello there"}"#,
    )
    .unwrap();
    assert!(matches!(
        input,
        ServerEventMessage::InputTranscript { ref text, .. } if text == "hello there"
    ));

    let output: ServerEventMessage = serde_json::from_str(
        r#"{"type": "output_transcript", "session_id": "s", "text": "hi"}"#,
    )
    .unwrap();
    assert!(matches!(output, ServerEventMessage::OutputTranscript { .. }));
}

#[test]
fn test_server_event_interrupted_roundtrip() {
    let msg = ServerEventMessage::Interrupted {
        session_id: "test-session".to_string(),
    };

    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("\"type\":\"interrupted\""));

    let deserialized: ServerEventMessage = serde_json::from_str(&json).unwrap();
    assert!(matches!(deserialized, ServerEventMessage::Interrupted { .. }));
}

#[test]
fn test_server_event_error_deserialization() {
    let json = r#"{
        "type": "error",
        "session_id": "test-session",
        "message": "quota exceeded"
    }"#;

    let msg: ServerEventMessage = serde_json::from_str(json).unwrap();
    assert!(matches!(
        msg,
        ServerEventMessage::Error { ref message, .. } if message == "quota exceeded"
    ));
}

#[test]
fn test_setup_message_roundtrip() {
    let msg = SessionSetupMessage {
        session_id: "test-session".to_string(),
        response_modality: "audio".to_string(),
        voice_name: "Zephyr".to_string(),
        system_instruction: "Be brief.".to_string(),
        input_transcription: true,
        output_transcription: true,
        input_sample_rate: 16000,
        output_sample_rate: 24000,
    };

    let json = serde_json::to_string(&msg).unwrap();
    let deserialized: SessionSetupMessage = serde_json::from_str(&json).unwrap();

    assert_eq!(deserialized.voice_name, "Zephyr");
    assert_eq!(deserialized.response_modality, "audio");
    assert!(deserialized.input_transcription);
    assert!(deserialized.output_transcription);
    assert_eq!(deserialized.input_sample_rate, 16000);
    assert_eq!(deserialized.output_sample_rate, 24000);
}

#[test]
fn test_pcm_encoding_roundtrip_through_frame() {
    let original_samples: Vec<i16> = vec![100, -200, 300, -400];

    let pcm_bytes: Vec<u8> = original_samples.iter().flat_map(|&s| s.to_le_bytes()).collect();
    let encoded = base64::engine::general_purpose::STANDARD.encode(&pcm_bytes);

    let msg = AudioFrameMessage {
        session_id: "test".to_string(),
        sequence: 0,
        pcm: encoded,
        sample_rate: 16000,
        channels: 1,
        timestamp: "2026-08-05T14:30:00Z".to_string(),
        final_frame: false,
    };

    let json = serde_json::to_string(&msg).unwrap();
    let deserialized: AudioFrameMessage = serde_json::from_str(&json).unwrap();

    let decoded_bytes = base64::engine::general_purpose::STANDARD
        .decode(&deserialized.pcm)
        .unwrap();
    let decoded_samples: Vec<i16> = decoded_bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect();

    assert_eq!(decoded_samples, original_samples);
}
