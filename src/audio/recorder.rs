use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::codec;
use super::playback::AudioChunk;

/// Writes the synthesized output audio of one session to a WAV file.
///
/// Chunks are appended in scheduling order as they arrive; interruptions
/// are not represented (the recording is the audio the service produced,
/// not the audio that reached the speaker).
pub struct OutputRecorder {
    writer: Option<hound::WavWriter<BufWriter<File>>>,
    path: PathBuf,
    sample_count: usize,
}

impl OutputRecorder {
    pub fn create(
        dir: impl AsRef<Path>,
        session_id: &str,
        sample_rate: u32,
        channels: u16,
    ) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).context("Failed to create recordings directory")?;

        let path = dir.join(format!("{}.wav", session_id));

        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let writer = hound::WavWriter::create(&path, spec)
            .with_context(|| format!("Failed to create WAV file: {:?}", path))?;

        info!("Recording session output to {}", path.display());

        Ok(Self {
            writer: Some(writer),
            path,
            sample_count: 0,
        })
    }

    pub fn write_chunk(&mut self, chunk: &AudioChunk) -> Result<()> {
        if let Some(writer) = &mut self.writer {
            for sample in codec::quantize(&chunk.samples) {
                writer
                    .write_sample(sample)
                    .context("Failed to write sample to WAV")?;
            }

            self.sample_count += chunk.samples.len();
        }

        Ok(())
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn finish(mut self) -> Result<PathBuf> {
        if let Some(writer) = self.writer.take() {
            writer.finalize().context("Failed to finalize WAV file")?;
        }

        info!(
            "Session recording complete: {} ({} samples)",
            self.path.display(),
            self.sample_count
        );

        Ok(self.path.clone())
    }
}

impl Drop for OutputRecorder {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.take() {
            if let Err(e) = writer.finalize() {
                warn!("Failed to finalize WAV writer on drop: {}", e);
            }
        }
    }
}
