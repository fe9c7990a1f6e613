// Live Session Example: full bidirectional voice loop
//
// This example drives the complete pipeline:
// 1. Audio is captured from the microphone (or streamed from a WAV file)
// 2. Frames are quantized to 16-bit PCM, base64-encoded, and published
// 3. The inference service replies with synthesized audio and transcripts
// 4. Synthesized chunks are scheduled gaplessly onto the speaker
// 5. Transcripts for both directions are printed when the session ends
//
// Prerequisites:
// - NATS server running: docker run -p 4222:4222 nats
// - An inference bridge subscribed to voice.audio.* / publishing voice.events.*
//
// Usage: cargo run --example live_session [input.wav]

use anyhow::Result;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;
use voxlink::{CaptureSource, LiveSession, PlaybackTarget, SessionConfig, Speaker};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let capture_source = match std::env::args().nth(1) {
        Some(path) => {
            info!("Streaming capture from {}", path);
            CaptureSource::File(path)
        }
        None => CaptureSource::Microphone,
    };

    let config = SessionConfig {
        capture_source,
        playback_target: PlaybackTarget::Device,
        ..SessionConfig::default()
    };

    let session = LiveSession::new(config);

    session.start().await?;
    info!("Session streaming; press Ctrl+C to stop");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupt received");
        }
        _ = sleep(Duration::from_secs(120)) => {
            info!("Demo time limit reached");
        }
    }

    let stats = session.stop().await?;

    println!("\n--- Session summary ---");
    println!("Frames sent:      {}", stats.frames_sent);
    println!("Chunks scheduled: {}", stats.chunks_scheduled);
    println!("Duration:         {:.1}s", stats.duration_secs);

    println!("\n--- Transcript ---");
    for entry in session.transcript().await {
        let who = match entry.speaker {
            Speaker::User => "you",
            Speaker::Model => "model",
        };
        println!("[{}] {}", who, entry.text);
    }

    Ok(())
}
