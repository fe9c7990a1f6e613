// Tests for the session output recorder
//
// The recorder writes the synthesized audio of one session to a single
// WAV take, quantizing back to 16-bit PCM.

use tempfile::TempDir;
use voxlink::audio::{AudioChunk, OutputRecorder};

#[test]
fn test_recorder_writes_wav_take() {
    let dir = TempDir::new().unwrap();

    let mut recorder = OutputRecorder::create(dir.path(), "rec-test", 24000, 1).unwrap();

    let chunk = AudioChunk {
        samples: vec![0.0; 2400], // 100ms at 24kHz
        sample_rate: 24000,
        channels: 1,
    };
    recorder.write_chunk(&chunk).unwrap();
    recorder.write_chunk(&chunk).unwrap();

    assert_eq!(recorder.sample_count(), 4800);

    let path = recorder.finish().unwrap();
    assert!(path.exists(), "Recording file should exist");
    assert!(path.to_string_lossy().ends_with("rec-test.wav"));

    let reader = hound::WavReader::open(&path).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.sample_rate, 24000);
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(reader.duration(), 4800);
}

#[test]
fn test_recorder_quantizes_samples() {
    let dir = TempDir::new().unwrap();

    let mut recorder = OutputRecorder::create(dir.path(), "quantize-test", 24000, 1).unwrap();
    recorder
        .write_chunk(&AudioChunk {
            samples: vec![0.5, -0.5],
            sample_rate: 24000,
            channels: 1,
        })
        .unwrap();

    let path = recorder.finish().unwrap();

    let reader = hound::WavReader::open(&path).unwrap();
    let samples: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(samples, vec![16384, -16384]);
}

#[test]
fn test_recorder_creates_missing_directory() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("takes").join("today");

    let recorder = OutputRecorder::create(&nested, "nested-test", 24000, 1).unwrap();
    let path = recorder.finish().unwrap();

    assert!(path.exists());
    assert!(nested.exists());
}
