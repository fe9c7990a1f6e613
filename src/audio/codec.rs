// PCM conversion and transport framing
//
// The inference service speaks raw 16-bit little-endian PCM, base64-encoded
// inside JSON frames: 16kHz mono inbound (microphone), 24kHz mono outbound
// (synthesized voice).

use base64::Engine;

use crate::error::VoiceError;

/// Sample rate of microphone capture sent to the service
pub const CAPTURE_SAMPLE_RATE: u32 = 16_000;

/// Sample rate of synthesized audio received from the service
pub const PLAYBACK_SAMPLE_RATE: u32 = 24_000;

/// Quantize normalized f32 samples to 16-bit signed PCM.
///
/// Multiplies by 32768 and truncates. Values outside [-1, 1] wrap rather
/// than clamp, matching the service's wire contract; capture data is
/// expected to be normalized.
pub fn quantize(samples: &[f32]) -> Vec<i16> {
    samples.iter().map(|&s| (s * 32768.0) as i32 as i16).collect()
}

/// Expand 16-bit PCM back to normalized f32 samples.
pub fn dequantize(samples: &[i16]) -> Vec<f32> {
    samples.iter().map(|&s| s as f32 / 32768.0).collect()
}

/// Pack i16 samples as little-endian bytes.
pub fn pcm_to_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

/// Unpack little-endian bytes into i16 samples.
///
/// A payload with an odd byte length is truncated PCM and rejected.
pub fn bytes_to_pcm(bytes: &[u8]) -> Result<Vec<i16>, VoiceError> {
    if bytes.len() % 2 != 0 {
        return Err(VoiceError::Decode(format!(
            "truncated PCM payload: {} bytes",
            bytes.len()
        )));
    }

    Ok(bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

/// Encode one capture frame for transport: quantize, pack, base64.
pub fn encode_frame(samples: &[f32]) -> String {
    let pcm = pcm_to_bytes(&quantize(samples));
    base64::engine::general_purpose::STANDARD.encode(pcm)
}

/// Decode one inbound audio payload: base64, unpack, dequantize.
pub fn decode_frame(payload: &str) -> Result<Vec<f32>, VoiceError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| VoiceError::Decode(format!("invalid base64: {}", e)))?;

    Ok(dequantize(&bytes_to_pcm(&bytes)?))
}
