use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

use crate::error::VoiceError;

/// A fixed-size frame of normalized f32 samples from a capture source.
///
/// One transport frame is emitted per capture frame; frames are never
/// batched or reordered.
#[derive(Debug, Clone)]
pub struct CaptureFrame {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Configuration for capture backends
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Capture sample rate (the inference service expects 16kHz)
    pub sample_rate: u32,
    /// Channel count (1 = mono)
    pub channels: u16,
    /// Samples per emitted frame
    pub frame_size: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: super::codec::CAPTURE_SAMPLE_RATE,
            channels: 1,
            frame_size: 4096,
        }
    }
}

/// Audio capture backend trait
///
/// Implementations:
/// - Microphone: cpal input stream on a dedicated thread
/// - File: WAV file streamed at capture cadence (demos, tests)
#[async_trait::async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Open the source and start capturing.
    ///
    /// Returns a channel receiver that will receive capture frames.
    /// Fails with `CaptureUnavailable` if the source cannot be opened.
    async fn start(&mut self) -> Result<mpsc::Receiver<CaptureFrame>, VoiceError>;

    /// Stop capturing and release the source handle. Idempotent.
    async fn stop(&mut self) -> Result<(), VoiceError>;

    /// Check if the backend is currently capturing
    fn is_capturing(&self) -> bool;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Capture source type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureSource {
    /// Default microphone input
    Microphone,
    /// WAV file streamed as if it were live input
    File(String),
}

/// Capture backend factory
pub struct CaptureBackendFactory;

impl CaptureBackendFactory {
    pub fn create(
        source: CaptureSource,
        config: CaptureConfig,
    ) -> Result<Box<dyn CaptureBackend>, VoiceError> {
        match source {
            CaptureSource::Microphone => Ok(Box::new(MicrophoneBackend::new(config))),
            CaptureSource::File(path) => Ok(Box::new(FileBackend::new(path, config))),
        }
    }
}

// ============================================================================
// Microphone backend (cpal)
// ============================================================================

/// Microphone capture via cpal.
///
/// cpal streams are not `Send`, so the stream lives on a dedicated thread
/// that forwards frames into a tokio channel. The audio callback must not
/// block: frames are handed off with `try_send`, and a frame is dropped if
/// the consumer falls behind.
pub struct MicrophoneBackend {
    config: CaptureConfig,
    capturing: Arc<AtomicBool>,
}

impl MicrophoneBackend {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            capturing: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait::async_trait]
impl CaptureBackend for MicrophoneBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<CaptureFrame>, VoiceError> {
        if self.capturing.load(Ordering::SeqCst) {
            return Err(VoiceError::CaptureUnavailable(
                "microphone already capturing".to_string(),
            ));
        }

        info!(
            "Opening microphone ({}Hz, {} channels, frame size {})",
            self.config.sample_rate, self.config.channels, self.config.frame_size
        );

        let (frame_tx, frame_rx) = mpsc::channel(32);
        let (ready_tx, ready_rx) = oneshot::channel();
        let config = self.config.clone();
        let capturing = Arc::clone(&self.capturing);

        std::thread::spawn(move || {
            run_input_stream(config, capturing, frame_tx, ready_tx);
        });

        // The thread reports whether the device opened before any frame flows.
        ready_rx
            .await
            .map_err(|_| {
                VoiceError::CaptureUnavailable("capture thread exited before opening device".to_string())
            })??;

        info!("Microphone capture started");

        Ok(frame_rx)
    }

    async fn stop(&mut self) -> Result<(), VoiceError> {
        if !self.capturing.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        info!("Microphone capture stopped");

        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "microphone"
    }
}

/// Owns the cpal input stream for the lifetime of the capture.
fn run_input_stream(
    config: CaptureConfig,
    capturing: Arc<AtomicBool>,
    frame_tx: mpsc::Sender<CaptureFrame>,
    ready_tx: oneshot::Sender<Result<(), VoiceError>>,
) {
    match open_input_stream(&config, frame_tx) {
        Ok(stream) => {
            capturing.store(true, Ordering::SeqCst);
            let _ = ready_tx.send(Ok(()));

            while capturing.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(50));
            }

            // Dropping the stream releases the device handle.
            drop(stream);
        }
        Err(e) => {
            let _ = ready_tx.send(Err(e));
        }
    }
}

fn open_input_stream(
    config: &CaptureConfig,
    frame_tx: mpsc::Sender<CaptureFrame>,
) -> Result<cpal::Stream, VoiceError> {
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| VoiceError::CaptureUnavailable("no input device".to_string()))?;

    let stream_config = cpal::StreamConfig {
        channels: config.channels,
        sample_rate: cpal::SampleRate(config.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let frame_size = config.frame_size;
    let sample_rate = config.sample_rate;
    let channels = config.channels;
    let mut pending: Vec<f32> = Vec::with_capacity(frame_size * 2);

    let stream = device
        .build_input_stream(
            &stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                pending.extend_from_slice(data);
                while pending.len() >= frame_size {
                    let samples: Vec<f32> = pending.drain(..frame_size).collect();
                    // Dropping a frame is preferable to blocking the callback.
                    if frame_tx
                        .try_send(CaptureFrame {
                            samples,
                            sample_rate,
                            channels,
                        })
                        .is_err()
                    {
                        warn!("Capture frame dropped: consumer not keeping up");
                    }
                }
            },
            |e| error!("Input stream error: {}", e),
            None,
        )
        .map_err(|e| VoiceError::CaptureUnavailable(format!("failed to open input stream: {}", e)))?;

    stream
        .play()
        .map_err(|e| VoiceError::CaptureUnavailable(format!("failed to start input stream: {}", e)))?;

    Ok(stream)
}

// ============================================================================
// File backend (WAV)
// ============================================================================

/// WAV-file-backed capture source.
///
/// Streams the file's samples in capture-sized frames at the cadence a
/// live microphone would produce them.
pub struct FileBackend {
    path: String,
    config: CaptureConfig,
    capturing: Arc<AtomicBool>,
}

impl FileBackend {
    pub fn new(path: String, config: CaptureConfig) -> Self {
        Self {
            path,
            config,
            capturing: Arc::new(AtomicBool::new(false)),
        }
    }

    fn read_samples(&self) -> Result<Vec<f32>, VoiceError> {
        let reader = hound::WavReader::open(&self.path).map_err(|e| {
            VoiceError::CaptureUnavailable(format!("failed to open {}: {}", self.path, e))
        })?;

        let spec = reader.spec();
        let samples = match spec.sample_format {
            hound::SampleFormat::Int => reader
                .into_samples::<i16>()
                .collect::<Result<Vec<_>, _>>()
                .map(|pcm| super::codec::dequantize(&pcm)),
            hound::SampleFormat::Float => reader.into_samples::<f32>().collect(),
        }
        .map_err(|e| {
            VoiceError::CaptureUnavailable(format!("failed to read {}: {}", self.path, e))
        })?;

        if spec.sample_rate != self.config.sample_rate || spec.channels != self.config.channels {
            warn!(
                "Capture file is {}Hz/{}ch, streaming as {}Hz/{}ch",
                spec.sample_rate, spec.channels, self.config.sample_rate, self.config.channels
            );
        }

        Ok(samples)
    }
}

#[async_trait::async_trait]
impl CaptureBackend for FileBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<CaptureFrame>, VoiceError> {
        if self.capturing.load(Ordering::SeqCst) {
            return Err(VoiceError::CaptureUnavailable(
                "file source already capturing".to_string(),
            ));
        }

        let samples = self.read_samples()?;

        info!(
            "Streaming capture file {} ({} samples)",
            self.path,
            samples.len()
        );

        let (frame_tx, frame_rx) = mpsc::channel(32);
        let config = self.config.clone();
        self.capturing.store(true, Ordering::SeqCst);

        let pacing = Arc::clone(&self.capturing);
        tokio::spawn(async move {
            let frame_duration =
                Duration::from_secs_f64(config.frame_size as f64 / config.sample_rate as f64);

            for chunk in samples.chunks(config.frame_size) {
                if !pacing.load(Ordering::SeqCst) {
                    break;
                }

                let frame = CaptureFrame {
                    samples: chunk.to_vec(),
                    sample_rate: config.sample_rate,
                    channels: config.channels,
                };

                if frame_tx.send(frame).await.is_err() {
                    break;
                }

                tokio::time::sleep(frame_duration).await;
            }

            pacing.store(false, Ordering::SeqCst);
            info!("Capture file exhausted");
        });

        Ok(frame_rx)
    }

    async fn stop(&mut self) -> Result<(), VoiceError> {
        self.capturing.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "file"
    }
}
