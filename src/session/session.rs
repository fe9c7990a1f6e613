use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::config::SessionConfig;
use super::state::{SessionState, StateCell};
use super::stats::{SessionStats, Speaker, TranscriptEntry};
use crate::audio::codec;
use crate::audio::playback::{self, AudioChunk, AudioSink, PlaybackScheduler};
use crate::audio::{CaptureBackend, CaptureBackendFactory, CaptureConfig, CaptureFrame, OutputRecorder};
use crate::error::VoiceError;
use crate::transport::{EventStream, ServerEvent, SessionSetupMessage, TransportClient};

type SharedBackend = Arc<Mutex<Option<Box<dyn CaptureBackend>>>>;

/// A live voice session: microphone capture, bidirectional transport, and
/// gapless playback of the synthesized reply.
///
/// At most one session is meant to be open at a time; the state machine
/// rejects a second `start` while one is active. The session owns the
/// capture handle and the playback scheduling cursor for its lifetime.
pub struct LiveSession {
    /// Session configuration
    config: SessionConfig,

    /// Lifecycle state machine
    state: Arc<StateCell>,

    /// When the session was created
    started_at: chrono::DateTime<chrono::Utc>,

    /// Outbound frames published
    frames_sent: Arc<AtomicUsize>,

    /// Inbound chunks scheduled for playback
    chunks_scheduled: Arc<AtomicUsize>,

    /// Append-only transcript of both directions
    transcript: Arc<Mutex<Vec<TranscriptEntry>>>,

    /// Capture backend, held so stop can release the device
    capture_backend: SharedBackend,

    /// Transport connection, held so stop can close it
    transport: Arc<Mutex<Option<TransportClient>>>,

    /// Handle for the outbound capture task
    capture_task: Arc<Mutex<Option<JoinHandle<()>>>>,

    /// Handle for the inbound event task
    event_task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl LiveSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            state: Arc::new(StateCell::new(SessionState::Idle)),
            started_at: Utc::now(),
            frames_sent: Arc::new(AtomicUsize::new(0)),
            chunks_scheduled: Arc::new(AtomicUsize::new(0)),
            transcript: Arc::new(Mutex::new(Vec::new())),
            capture_backend: Arc::new(Mutex::new(None)),
            transport: Arc::new(Mutex::new(None)),
            capture_task: Arc::new(Mutex::new(None)),
            event_task: Arc::new(Mutex::new(None)),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.config.session_id
    }

    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    /// Open the capture source, connect the transport, and start
    /// streaming.
    ///
    /// Capture opens first: if the microphone is unavailable the session
    /// stays idle and no transport connection is attempted. A start while
    /// another session phase is active is rejected.
    pub async fn start(&self) -> Result<(), VoiceError> {
        if !self.state.transition(SessionState::Idle, SessionState::Starting) {
            warn!("Start rejected: session {} is not idle", self.config.session_id);
            return Err(VoiceError::AlreadyStreaming);
        }

        info!("Starting live session: {}", self.config.session_id);

        match self.open_pipeline().await {
            Ok(()) => {
                self.state.set(SessionState::Streaming);
                info!("Live session streaming: {}", self.config.session_id);
                Ok(())
            }
            Err(e) => {
                // Whatever opened before the failure is released here.
                if let Some(mut backend) = self.capture_backend.lock().await.take() {
                    let _ = backend.stop().await;
                }
                self.transport.lock().await.take();
                self.state.set(SessionState::Idle);
                Err(e)
            }
        }
    }

    async fn open_pipeline(&self) -> Result<(), VoiceError> {
        let capture_config = CaptureConfig {
            sample_rate: self.config.capture_sample_rate,
            channels: self.config.channels,
            frame_size: self.config.frame_size,
        };

        let mut backend =
            CaptureBackendFactory::create(self.config.capture_source.clone(), capture_config)?;
        let frame_rx = backend.start().await?;
        *self.capture_backend.lock().await = Some(backend);

        let transport = TransportClient::connect(
            &self.config.transport_url,
            self.config.auth_token.as_deref(),
            self.config.session_id.clone(),
        )
        .await?;

        // Subscribe before setup so no early event is missed.
        let events = transport.subscribe_events().await?;

        transport
            .send_setup(&SessionSetupMessage {
                session_id: self.config.session_id.clone(),
                response_modality: "audio".to_string(),
                voice_name: self.config.voice_name.clone(),
                system_instruction: self.config.system_instruction.clone(),
                input_transcription: true,
                output_transcription: true,
                input_sample_rate: self.config.capture_sample_rate,
                output_sample_rate: self.config.playback_sample_rate,
            })
            .await?;

        let sink = playback::open_sink(
            self.config.playback_target,
            self.config.playback_sample_rate,
        )
        .await?;

        let recorder = match &self.config.recordings_path {
            Some(dir) => match OutputRecorder::create(
                dir,
                &self.config.session_id,
                self.config.playback_sample_rate,
                self.config.channels,
            ) {
                Ok(recorder) => Some(recorder),
                Err(e) => {
                    warn!("Output recording disabled: {}", e);
                    None
                }
            },
            None => None,
        };

        *self.transport.lock().await = Some(transport.clone());

        let capture_task = tokio::spawn(run_capture_loop(
            frame_rx,
            transport.clone(),
            Arc::clone(&self.state),
            Arc::clone(&self.frames_sent),
            self.config.capture_sample_rate,
            self.config.channels,
        ));
        *self.capture_task.lock().await = Some(capture_task);

        let event_task = tokio::spawn(run_event_loop(
            events,
            PlaybackScheduler::new(sink),
            recorder,
            Arc::clone(&self.state),
            Arc::clone(&self.transcript),
            Arc::clone(&self.chunks_scheduled),
            Arc::clone(&self.capture_backend),
        ));
        *self.event_task.lock().await = Some(event_task);

        Ok(())
    }

    /// Stop streaming, release the microphone, and close the transport.
    ///
    /// Idempotent: stopping an idle session (or stopping twice) changes
    /// nothing and returns current stats.
    pub async fn stop(&self) -> Result<SessionStats, VoiceError> {
        if !self
            .state
            .transition(SessionState::Streaming, SessionState::Stopping)
        {
            warn!("Stop requested with no active session");
            return Ok(self.stats().await);
        }

        info!("Stopping live session: {}", self.config.session_id);

        // Release the microphone first; this ends the outbound stream.
        if let Some(mut backend) = self.capture_backend.lock().await.take() {
            if let Err(e) = backend.stop().await {
                warn!("Failed to stop capture backend: {}", e);
            }
        }

        // The capture task drains its channel and publishes a final frame.
        if let Some(task) = self.capture_task.lock().await.take() {
            if let Err(e) = task.await {
                error!("Capture task panicked: {}", e);
            }
        }

        // The event task parks on the subscription; cancel it at its
        // await point.
        if let Some(task) = self.event_task.lock().await.take() {
            task.abort();
            let _ = task.await;
        }

        if let Some(transport) = self.transport.lock().await.take() {
            if let Err(e) = transport.close().await {
                warn!("Transport close failed: {}", e);
            }
        }

        self.state.set(SessionState::Idle);

        info!("Live session stopped: {}", self.config.session_id);

        Ok(self.stats().await)
    }

    /// Get current session statistics
    pub async fn stats(&self) -> SessionStats {
        let duration = Utc::now().signed_duration_since(self.started_at);

        let transcript_entries = {
            let transcript = self.transcript.lock().await;
            transcript.len()
        };

        SessionStats {
            state: self.state.get(),
            started_at: self.started_at,
            duration_secs: duration.num_milliseconds() as f64 / 1000.0,
            frames_sent: self.frames_sent.load(Ordering::SeqCst),
            chunks_scheduled: self.chunks_scheduled.load(Ordering::SeqCst),
            transcript_entries,
        }
    }

    /// Get the accumulated transcript
    pub async fn transcript(&self) -> Vec<TranscriptEntry> {
        let transcript = self.transcript.lock().await;
        transcript.clone()
    }
}

/// Outbound half: encode each capture frame and publish it.
///
/// One frame out per frame in, in order, fire-and-forget. Publish
/// failures are logged, not retried; the inbound half decides session
/// termination.
async fn run_capture_loop(
    mut frame_rx: mpsc::Receiver<CaptureFrame>,
    transport: TransportClient,
    state: Arc<StateCell>,
    frames_sent: Arc<AtomicUsize>,
    sample_rate: u32,
    channels: u16,
) {
    info!("Capture task started");

    let mut sequence: u32 = 0;

    while let Some(frame) = frame_rx.recv().await {
        if !matches!(
            state.get(),
            SessionState::Starting | SessionState::Streaming
        ) {
            break;
        }

        let payload = codec::encode_frame(&frame.samples);

        if let Err(e) = transport
            .publish_audio_frame(payload, frame.sample_rate, frame.channels, sequence, false)
            .await
        {
            error!("Failed to publish audio frame: {}", e);
        }

        sequence = sequence.wrapping_add(1);
        frames_sent.fetch_add(1, Ordering::SeqCst);
    }

    // Final empty frame marks the end of the outbound stream.
    if let Err(e) = transport
        .publish_audio_frame(String::new(), sample_rate, channels, sequence, true)
        .await
    {
        error!("Failed to publish final frame: {}", e);
    }

    info!("Capture task stopped");
}

/// Inbound half: decode server events into playback, transcript, and
/// lifecycle effects.
///
/// Any terminal condition (server close, server error, malformed audio)
/// releases the capture handle and returns the session to idle; nothing
/// is retried.
async fn run_event_loop(
    mut events: EventStream,
    mut scheduler: PlaybackScheduler<Box<dyn AudioSink + Send>>,
    mut recorder: Option<OutputRecorder>,
    state: Arc<StateCell>,
    transcript: Arc<Mutex<Vec<TranscriptEntry>>>,
    chunks_scheduled: Arc<AtomicUsize>,
    capture_backend: SharedBackend,
) {
    info!("Event task started");

    while let Some(event) = events.next().await {
        if !matches!(
            state.get(),
            SessionState::Starting | SessionState::Streaming
        ) {
            break;
        }

        match event {
            Ok(ServerEvent::Audio {
                pcm,
                sample_rate,
                channels,
            }) => {
                let samples = match codec::bytes_to_pcm(&pcm) {
                    Ok(pcm16) => codec::dequantize(&pcm16),
                    Err(e) => {
                        error!("Terminating session on malformed audio: {}", e);
                        break;
                    }
                };

                let chunk = AudioChunk {
                    samples,
                    sample_rate,
                    channels,
                };

                if let Some(recorder) = recorder.as_mut() {
                    if let Err(e) = recorder.write_chunk(&chunk) {
                        warn!("Failed to record output chunk: {}", e);
                    }
                }

                match scheduler.schedule(chunk) {
                    Ok(start) => {
                        debug!("Scheduled chunk at {:.3}s", start);
                        chunks_scheduled.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(e) => {
                        error!("Failed to schedule chunk: {}", e);
                        break;
                    }
                }
            }

            Ok(ServerEvent::InputTranscript { text }) => {
                append_transcript(&transcript, Speaker::User, text).await;
            }

            Ok(ServerEvent::OutputTranscript { text }) => {
                append_transcript(&transcript, Speaker::Model, text).await;
            }

            Ok(ServerEvent::Interrupted) => {
                info!("Barge-in: resetting playback cursor");
                scheduler.interrupt();
            }

            Ok(ServerEvent::TurnComplete) => {
                debug!("Turn complete");
            }

            Ok(ServerEvent::Closed) => {
                info!("Server closed the stream");
                break;
            }

            Ok(ServerEvent::Error { message }) => {
                error!("Server error: {}", message);
                break;
            }

            Err(e) => {
                error!("Terminating session: {}", e);
                break;
            }
        }
    }

    if let Some(recorder) = recorder.take() {
        if let Err(e) = recorder.finish() {
            warn!("Failed to finalize output recording: {}", e);
        }
    }

    // Stream over: release the microphone and return to idle.
    if let Some(mut backend) = capture_backend.lock().await.take() {
        if let Err(e) = backend.stop().await {
            warn!("Failed to stop capture backend: {}", e);
        }
    }

    state.set(SessionState::Idle);

    info!("Event task stopped");
}

async fn append_transcript(
    transcript: &Arc<Mutex<Vec<TranscriptEntry>>>,
    speaker: Speaker,
    text: String,
) {
    let entry = TranscriptEntry {
        speaker,
        text,
        received_at: Utc::now(),
    };

    let mut transcript = transcript.lock().await;
    transcript.push(entry);
}
