use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub audio: AudioConfig,
    pub transport: TransportConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    /// Microphone sample rate (the inference service expects 16kHz mono)
    pub capture_sample_rate: u32,
    /// Synthesized audio sample rate (the service emits 24kHz mono)
    pub playback_sample_rate: u32,
    pub channels: u16,
    /// Samples per outbound transport frame
    pub frame_size: usize,
    /// Directory for optional WAV captures of synthesized output
    pub recordings_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TransportConfig {
    pub url: String,
    /// Auth token for the transport connection, if the server requires one
    pub auth_token: Option<String>,
    /// Prebuilt voice identity requested at session setup
    pub voice_name: String,
    pub system_instruction: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
