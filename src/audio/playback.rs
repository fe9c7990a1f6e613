// Gapless playback scheduling for synthesized audio
//
// Inbound chunks arrive with variable network timing. Each chunk is pinned
// to the end of the previously scheduled chunk (or the live output clock,
// whichever is later) rather than to its arrival time, so playback stays
// gapless and in order. A barge-in interruption resets the cursor; buffers
// already handed to the sink play out to completion.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::{error, info};

use crate::error::VoiceError;

/// A decoded audio chunk ready for scheduling.
///
/// Consumed exactly once by the scheduler; not persisted.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Interleaved normalized samples
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioChunk {
    /// Playback duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / (self.sample_rate as f64 * self.channels as f64)
    }
}

/// Destination for scheduled audio: an output clock plus a submit surface.
pub trait AudioSink: Send {
    /// Current position of the output clock, in seconds.
    fn now(&self) -> f64;

    /// Queue `chunk` to begin playing at `start` seconds on the output
    /// clock. Submitted buffers are never recalled.
    fn submit(&mut self, chunk: AudioChunk, start: f64) -> Result<(), VoiceError>;
}

impl AudioSink for Box<dyn AudioSink + Send> {
    fn now(&self) -> f64 {
        self.as_ref().now()
    }

    fn submit(&mut self, chunk: AudioChunk, start: f64) -> Result<(), VoiceError> {
        self.as_mut().submit(chunk, start)
    }
}

/// Maintains the scheduling cursor for gapless output.
///
/// The cursor is non-decreasing except on `interrupt`, which resets it to
/// zero so the next chunk re-pins to the live clock.
pub struct PlaybackScheduler<S: AudioSink> {
    sink: S,
    next_start_time: f64,
}

impl<S: AudioSink> PlaybackScheduler<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            next_start_time: 0.0,
        }
    }

    /// Schedule a chunk at the end of the current timeline.
    ///
    /// Returns the start time assigned to the chunk.
    pub fn schedule(&mut self, chunk: AudioChunk) -> Result<f64, VoiceError> {
        self.next_start_time = self.next_start_time.max(self.sink.now());

        let start = self.next_start_time;
        let duration = chunk.duration_secs();

        self.sink.submit(chunk, start)?;
        self.next_start_time = start + duration;

        Ok(start)
    }

    /// Barge-in: discard scheduling continuity.
    ///
    /// Buffers already submitted to the sink play out; only the cursor is
    /// reset, so the next chunk pins to the live clock.
    pub fn interrupt(&mut self) {
        self.next_start_time = 0.0;
    }

    pub fn next_start_time(&self) -> f64 {
        self.next_start_time
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

/// Playback target type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackTarget {
    /// Default speaker output
    Device,
    /// No audible output; clock advances in wall time (headless, tests)
    Discard,
}

/// Open a sink for the given target.
pub async fn open_sink(
    target: PlaybackTarget,
    sample_rate: u32,
) -> Result<Box<dyn AudioSink + Send>, VoiceError> {
    match target {
        PlaybackTarget::Device => Ok(Box::new(DeviceSink::open(sample_rate).await?)),
        PlaybackTarget::Discard => Ok(Box::new(DiscardSink::new())),
    }
}

// ============================================================================
// Device sink (cpal)
// ============================================================================

/// Buffers scheduled against the shared output timeline.
struct Scheduled {
    start_sample: u64,
    samples: Vec<f32>,
}

/// State shared between the submit side and the output callback.
struct Timeline {
    /// Samples emitted since the stream opened; the output clock.
    clock_samples: u64,
    queued: Vec<Scheduled>,
}

/// Speaker output via cpal.
///
/// The output callback sums every queued buffer overlapping the current
/// block, so post-interruption chunks can play over a still-draining
/// backlog. The clock is the count of emitted samples, which keeps
/// scheduling exact regardless of callback block size.
pub struct DeviceSink {
    sample_rate: u32,
    timeline: Arc<Mutex<Timeline>>,
    active: Arc<AtomicBool>,
}

impl DeviceSink {
    pub async fn open(sample_rate: u32) -> Result<Self, VoiceError> {
        let timeline = Arc::new(Mutex::new(Timeline {
            clock_samples: 0,
            queued: Vec::new(),
        }));
        let active = Arc::new(AtomicBool::new(true));

        let (ready_tx, ready_rx) = oneshot::channel();
        let thread_timeline = Arc::clone(&timeline);
        let thread_active = Arc::clone(&active);

        std::thread::spawn(move || {
            run_output_stream(sample_rate, thread_timeline, thread_active, ready_tx);
        });

        ready_rx
            .await
            .map_err(|_| {
                VoiceError::PlaybackUnavailable("output thread exited before opening device".to_string())
            })??;

        info!("Speaker output opened ({}Hz)", sample_rate);

        Ok(Self {
            sample_rate,
            timeline,
            active,
        })
    }

    /// Stop the output stream and release the device. Idempotent.
    pub fn close(&mut self) {
        if self.active.swap(false, Ordering::SeqCst) {
            info!("Speaker output closed");
        }
    }
}

impl Drop for DeviceSink {
    fn drop(&mut self) {
        self.close();
    }
}

impl AudioSink for DeviceSink {
    fn now(&self) -> f64 {
        let timeline = self.timeline.lock().expect("output timeline lock poisoned");
        timeline.clock_samples as f64 / self.sample_rate as f64
    }

    fn submit(&mut self, chunk: AudioChunk, start: f64) -> Result<(), VoiceError> {
        let start_sample = (start * self.sample_rate as f64).round() as u64;

        let mut timeline = self.timeline.lock().expect("output timeline lock poisoned");
        timeline.queued.push(Scheduled {
            start_sample,
            samples: chunk.samples,
        });

        Ok(())
    }
}

/// Owns the cpal output stream for the lifetime of the sink.
fn run_output_stream(
    sample_rate: u32,
    timeline: Arc<Mutex<Timeline>>,
    active: Arc<AtomicBool>,
    ready_tx: oneshot::Sender<Result<(), VoiceError>>,
) {
    match open_output_stream(sample_rate, Arc::clone(&timeline)) {
        Ok(stream) => {
            let _ = ready_tx.send(Ok(()));

            while active.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(50));
            }

            drop(stream);
        }
        Err(e) => {
            let _ = ready_tx.send(Err(e));
        }
    }
}

fn open_output_stream(
    sample_rate: u32,
    timeline: Arc<Mutex<Timeline>>,
) -> Result<cpal::Stream, VoiceError> {
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| VoiceError::PlaybackUnavailable("no output device".to_string()))?;

    let stream_config = cpal::StreamConfig {
        channels: 1,
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let stream = device
        .build_output_stream(
            &stream_config,
            move |out: &mut [f32], _: &cpal::OutputCallbackInfo| {
                // Short critical section: mix queued buffers into the block
                // and advance the clock.
                let mut timeline = timeline.lock().expect("output timeline lock poisoned");

                out.fill(0.0);

                let block_start = timeline.clock_samples;
                let block_end = block_start + out.len() as u64;

                for buf in &timeline.queued {
                    let buf_end = buf.start_sample + buf.samples.len() as u64;
                    if buf_end <= block_start || buf.start_sample >= block_end {
                        continue;
                    }

                    let from = block_start.max(buf.start_sample);
                    let to = block_end.min(buf_end);
                    for t in from..to {
                        out[(t - block_start) as usize] +=
                            buf.samples[(t - buf.start_sample) as usize];
                    }
                }

                timeline
                    .queued
                    .retain(|buf| buf.start_sample + buf.samples.len() as u64 > block_end);
                timeline.clock_samples = block_end;
            },
            |e| error!("Output stream error: {}", e),
            None,
        )
        .map_err(|e| {
            VoiceError::PlaybackUnavailable(format!("failed to open output stream: {}", e))
        })?;

    stream.play().map_err(|e| {
        VoiceError::PlaybackUnavailable(format!("failed to start output stream: {}", e))
    })?;

    Ok(stream)
}

// ============================================================================
// Discard sink
// ============================================================================

/// Sink with a wall-clock timeline and no audible output.
pub struct DiscardSink {
    opened_at: Instant,
    submitted: usize,
}

impl DiscardSink {
    pub fn new() -> Self {
        Self {
            opened_at: Instant::now(),
            submitted: 0,
        }
    }

    pub fn submitted(&self) -> usize {
        self.submitted
    }
}

impl Default for DiscardSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSink for DiscardSink {
    fn now(&self) -> f64 {
        self.opened_at.elapsed().as_secs_f64()
    }

    fn submit(&mut self, _chunk: AudioChunk, _start: f64) -> Result<(), VoiceError> {
        self.submitted += 1;
        Ok(())
    }
}
