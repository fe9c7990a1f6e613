/// Typed event emitted by an open transport session.
///
/// Events arrive in server-emission order. Audio payloads are raw PCM
/// bytes (base64 already stripped by the client); sample decoding is the
/// playback path's concern.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// Synthesized audio chunk (16-bit little-endian PCM bytes)
    Audio {
        pcm: Vec<u8>,
        sample_rate: u32,
        channels: u16,
    },
    /// Transcription of the caller's speech
    InputTranscript { text: String },
    /// Transcription of the model's speech
    OutputTranscript { text: String },
    /// The caller barged in; playback continuity should be discarded
    Interrupted,
    /// The model finished a response turn
    TurnComplete,
    /// The service closed the stream
    Closed,
    /// Server-reported failure; the session must terminate
    Error { message: String },
}
