// Tests for the playback scheduling cursor
//
// Chunks must play gaplessly in order regardless of arrival timing: each
// chunk starts where the previous one ends, or at the live clock if the
// timeline has drained. A barge-in interruption resets the cursor without
// recalling buffers already handed to the sink.

use voxlink::audio::codec::PLAYBACK_SAMPLE_RATE;
use voxlink::audio::{AudioChunk, AudioSink, DiscardSink, PlaybackScheduler};
use voxlink::VoiceError;

/// Sink with a hand-driven clock, recording every submission.
struct ManualSink {
    clock: f64,
    submitted: Vec<(f64, f64)>, // (start, duration)
}

impl ManualSink {
    fn new() -> Self {
        Self {
            clock: 0.0,
            submitted: Vec::new(),
        }
    }
}

impl AudioSink for ManualSink {
    fn now(&self) -> f64 {
        self.clock
    }

    fn submit(&mut self, chunk: AudioChunk, start: f64) -> Result<(), VoiceError> {
        self.submitted.push((start, chunk.duration_secs()));
        Ok(())
    }
}

/// A chunk of `ms` milliseconds at the playback rate (24kHz mono).
fn chunk_ms(ms: u32) -> AudioChunk {
    let samples = (PLAYBACK_SAMPLE_RATE * ms / 1000) as usize;
    AudioChunk {
        samples: vec![0.0; samples],
        sample_rate: PLAYBACK_SAMPLE_RATE,
        channels: 1,
    }
}

#[test]
fn test_sequential_chunks_schedule_gapless() {
    let mut scheduler = PlaybackScheduler::new(ManualSink::new());

    let t0 = scheduler.schedule(chunk_ms(100)).unwrap();
    let t1 = scheduler.schedule(chunk_ms(100)).unwrap();
    let t2 = scheduler.schedule(chunk_ms(100)).unwrap();

    assert!((t0 - 0.0).abs() < 1e-9);
    assert!((t1 - 0.1).abs() < 1e-9, "Second chunk should start at t0+100ms, got {}", t1);
    assert!((t2 - 0.2).abs() < 1e-9, "Third chunk should start at t0+200ms, got {}", t2);

    // Each start equals the previous chunk's end
    let submitted = &scheduler.sink().submitted;
    for pair in submitted.windows(2) {
        let (prev_start, prev_duration) = pair[0];
        let (next_start, _) = pair[1];
        assert!(
            (next_start - (prev_start + prev_duration)).abs() < 1e-9,
            "Gap between chunks: {} -> {}",
            prev_start + prev_duration,
            next_start
        );
    }
}

#[test]
fn test_chunk_pins_to_live_clock_when_timeline_drained() {
    let mut scheduler = PlaybackScheduler::new(ManualSink::new());

    scheduler.schedule(chunk_ms(100)).unwrap();

    // Playback has advanced past the scheduled backlog
    scheduler.sink_mut().clock = 0.5;

    let start = scheduler.schedule(chunk_ms(100)).unwrap();
    assert!(
        (start - 0.5).abs() < 1e-9,
        "Late chunk should pin to the live clock, got {}",
        start
    );
    assert!((scheduler.next_start_time() - 0.6).abs() < 1e-9);
}

#[test]
fn test_next_start_time_is_non_decreasing_without_interruption() {
    let mut scheduler = PlaybackScheduler::new(ManualSink::new());

    let mut previous = scheduler.next_start_time();
    for (i, clock) in [0.0, 0.02, 0.02, 0.4, 0.41, 0.41].iter().enumerate() {
        scheduler.sink_mut().clock = *clock;
        scheduler.schedule(chunk_ms(50)).unwrap();

        let current = scheduler.next_start_time();
        assert!(
            current >= previous,
            "Cursor decreased from {} to {} at chunk {}",
            previous,
            current,
            i
        );
        previous = current;
    }
}

#[test]
fn test_interrupt_resets_cursor() {
    let mut scheduler = PlaybackScheduler::new(ManualSink::new());

    scheduler.schedule(chunk_ms(100)).unwrap();
    scheduler.schedule(chunk_ms(100)).unwrap();
    assert!((scheduler.next_start_time() - 0.2).abs() < 1e-9);

    scheduler.interrupt();
    assert!(
        scheduler.next_start_time() == 0.0,
        "Interruption should reset the cursor"
    );
}

#[test]
fn test_chunk_after_interrupt_pins_to_current_clock() {
    let mut scheduler = PlaybackScheduler::new(ManualSink::new());

    scheduler.schedule(chunk_ms(100)).unwrap();
    scheduler.sink_mut().clock = 0.03;

    scheduler.interrupt();

    // The next chunk pins to the live clock, not the pre-interruption
    // backlog end (which was 0.1).
    let start = scheduler.schedule(chunk_ms(100)).unwrap();
    assert!(
        (start - 0.03).abs() < 1e-9,
        "Post-interrupt chunk should start at the live clock, got {}",
        start
    );
}

#[test]
fn test_interrupt_does_not_recall_submitted_buffers() {
    let mut scheduler = PlaybackScheduler::new(ManualSink::new());

    scheduler.schedule(chunk_ms(100)).unwrap();
    scheduler.schedule(chunk_ms(100)).unwrap();

    scheduler.interrupt();

    // Buffers already handed to the sink play out to completion.
    assert_eq!(
        scheduler.sink().submitted.len(),
        2,
        "Interruption must not cancel in-flight buffers"
    );
}

#[test]
fn test_three_chunks_interrupt_one_chunk_scenario() {
    let mut scheduler = PlaybackScheduler::new(ManualSink::new());

    let t0 = scheduler.schedule(chunk_ms(100)).unwrap();
    let t1 = scheduler.schedule(chunk_ms(100)).unwrap();
    let t2 = scheduler.schedule(chunk_ms(100)).unwrap();
    assert!((t0 - 0.0).abs() < 1e-9);
    assert!((t1 - 0.1).abs() < 1e-9);
    assert!((t2 - 0.2).abs() < 1e-9);

    scheduler.sink_mut().clock = 0.25;
    scheduler.interrupt();

    let t3 = scheduler.schedule(chunk_ms(100)).unwrap();
    assert!(
        (t3 - 0.25).abs() < 1e-9,
        "Chunk after barge-in should schedule at the clock, got {}",
        t3
    );
}

#[test]
fn test_discard_sink_counts_submissions() {
    let mut scheduler = PlaybackScheduler::new(DiscardSink::new());

    scheduler.schedule(chunk_ms(10)).unwrap();
    scheduler.schedule(chunk_ms(10)).unwrap();

    assert_eq!(scheduler.sink().submitted(), 2);
}

#[test]
fn test_audio_chunk_duration() {
    let chunk = AudioChunk {
        samples: vec![0.0; 2400],
        sample_rate: 24000,
        channels: 1,
    };

    assert!((chunk.duration_secs() - 0.1).abs() < 1e-9, "2400 samples at 24kHz is 100ms");
}
