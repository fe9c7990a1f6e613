use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use voxlink::{create_router, AppState, CaptureSource, Config, PlaybackTarget, SessionConfig};

#[derive(Debug, Parser)]
#[command(name = "voxlink", about = "Real-time bidirectional voice streaming service")]
struct Args {
    /// Path to the configuration file (without extension)
    #[arg(long, default_value = "config/voxlink")]
    config: String,

    /// Stream a WAV file instead of the microphone
    #[arg(long)]
    capture_file: Option<String>,

    /// Discard synthesized audio instead of playing it (headless)
    #[arg(long)]
    no_playback: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("voxlink v0.1.0");
    info!("Loaded config: {}", cfg.service.name);
    info!(
        "Transport: {} (voice: {})",
        cfg.transport.url, cfg.transport.voice_name
    );

    let defaults = SessionConfig {
        capture_source: match args.capture_file {
            Some(path) => CaptureSource::File(path),
            None => CaptureSource::Microphone,
        },
        playback_target: if args.no_playback {
            PlaybackTarget::Discard
        } else {
            PlaybackTarget::Device
        },
        capture_sample_rate: cfg.audio.capture_sample_rate,
        playback_sample_rate: cfg.audio.playback_sample_rate,
        channels: cfg.audio.channels,
        frame_size: cfg.audio.frame_size,
        transport_url: cfg.transport.url.clone(),
        auth_token: cfg.transport.auth_token.clone(),
        voice_name: cfg.transport.voice_name.clone(),
        system_instruction: cfg.transport.system_instruction.clone(),
        recordings_path: cfg.audio.recordings_path.clone(),
        ..SessionConfig::default()
    };

    let state = AppState::new(defaults);
    let router = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    info!("HTTP server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr.as_str())
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, router).await?;

    Ok(())
}
