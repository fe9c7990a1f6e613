pub mod capture;
pub mod codec;
pub mod playback;
pub mod recorder;

pub use capture::{CaptureBackend, CaptureBackendFactory, CaptureConfig, CaptureFrame, CaptureSource};
pub use playback::{AudioChunk, AudioSink, DeviceSink, DiscardSink, PlaybackScheduler, PlaybackTarget};
pub use recorder::OutputRecorder;
