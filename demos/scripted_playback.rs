// Scripted Playback Example: the scheduling cursor without a network
//
// Feeds generated tone chunks through the playback scheduler at uneven
// arrival times, then simulates a barge-in. With gapless scheduling the
// tone is continuous despite the bursty arrivals; after the interruption
// the next chunk pins to the live clock.
//
// Usage: cargo run --example scripted_playback

use anyhow::Result;
use std::f32::consts::TAU;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;
use voxlink::audio::codec::PLAYBACK_SAMPLE_RATE;
use voxlink::audio::playback::DeviceSink;
use voxlink::{AudioChunk, PlaybackScheduler};

/// One chunk of sine tone at the playback rate.
fn tone_chunk(freq: f32, ms: u32) -> AudioChunk {
    let count = (PLAYBACK_SAMPLE_RATE * ms / 1000) as usize;
    let samples = (0..count)
        .map(|i| (TAU * freq * i as f32 / PLAYBACK_SAMPLE_RATE as f32).sin() * 0.2)
        .collect();

    AudioChunk {
        samples,
        sample_rate: PLAYBACK_SAMPLE_RATE,
        channels: 1,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let sink = DeviceSink::open(PLAYBACK_SAMPLE_RATE).await?;
    let mut scheduler = PlaybackScheduler::new(sink);

    // Bursty arrivals: three chunks at once, then a late one.
    for _ in 0..3 {
        let start = scheduler.schedule(tone_chunk(440.0, 200))?;
        info!("Chunk scheduled at {:.3}s", start);
    }

    sleep(Duration::from_millis(500)).await;

    let start = scheduler.schedule(tone_chunk(440.0, 200))?;
    info!("Late chunk scheduled at {:.3}s", start);

    sleep(Duration::from_millis(100)).await;

    // Barge-in: the cursor resets and the next chunk plays immediately,
    // over whatever backlog is still draining.
    scheduler.interrupt();
    let start = scheduler.schedule(tone_chunk(880.0, 400))?;
    info!("Post-interrupt chunk scheduled at {:.3}s", start);

    sleep(Duration::from_millis(600)).await;

    Ok(())
}
