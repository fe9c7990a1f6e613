use async_nats::Client;
use base64::Engine;
use futures::stream::StreamExt;
use tracing::{debug, info, warn};

use super::events::ServerEvent;
use super::messages::{AudioFrameMessage, ServerEventMessage, SessionSetupMessage};
use crate::error::VoiceError;

/// Bidirectional stream to the inference service.
///
/// Outbound audio frames go to `voice.audio.<session>`, fire-and-forget.
/// Inbound events arrive on `voice.events.<session>` in emission order.
/// The two directions are independent streams with no cross-ordering
/// guarantee.
#[derive(Clone)]
pub struct TransportClient {
    client: Client,
    session_id: String,
}

impl TransportClient {
    /// Connect to the transport server.
    ///
    /// The auth token, if any, comes from process configuration.
    pub async fn connect(
        url: &str,
        auth_token: Option<&str>,
        session_id: String,
    ) -> Result<Self, VoiceError> {
        info!("Connecting to transport at {}", url);

        let client = match auth_token {
            Some(token) => {
                async_nats::ConnectOptions::with_token(token.to_string())
                    .connect(url)
                    .await
            }
            None => async_nats::connect(url).await,
        }
        .map_err(|e| VoiceError::Session(format!("failed to connect to {}: {}", url, e)))?;

        info!("Connected to transport");

        Ok(Self { client, session_id })
    }

    /// Publish the session setup, negotiating modality, voice and
    /// transcription before any audio flows.
    pub async fn send_setup(&self, setup: &SessionSetupMessage) -> Result<(), VoiceError> {
        let subject = format!("voice.setup.{}", self.session_id);

        let payload = serde_json::to_vec(setup)
            .map_err(|e| VoiceError::Session(format!("failed to encode setup: {}", e)))?;

        self.client
            .publish(subject.clone(), payload.into())
            .await
            .map_err(|e| VoiceError::Session(format!("failed to publish setup: {}", e)))?;

        info!("Published session setup to {}", subject);

        Ok(())
    }

    /// Publish one encoded audio frame. Fire-and-forget, no acknowledgment.
    pub async fn publish_audio_frame(
        &self,
        pcm_base64: String,
        sample_rate: u32,
        channels: u16,
        sequence: u32,
        is_final: bool,
    ) -> Result<(), VoiceError> {
        let subject = format!("voice.audio.{}", self.session_id);

        let message = AudioFrameMessage {
            session_id: self.session_id.clone(),
            sequence,
            pcm: pcm_base64,
            sample_rate,
            channels,
            timestamp: chrono::Utc::now().to_rfc3339(),
            final_frame: is_final,
        };

        let payload = serde_json::to_vec(&message)
            .map_err(|e| VoiceError::Session(format!("failed to encode frame: {}", e)))?;

        self.client
            .publish(subject, payload.into())
            .await
            .map_err(|e| VoiceError::Session(format!("failed to publish frame: {}", e)))?;

        debug!("Published audio frame (seq={}, final={})", sequence, is_final);

        Ok(())
    }

    /// Subscribe to server events for this session.
    pub async fn subscribe_events(&self) -> Result<EventStream, VoiceError> {
        let subject = format!("voice.events.{}", self.session_id);

        info!("Subscribing to server events on {}", subject);

        let subscriber = self
            .client
            .subscribe(subject)
            .await
            .map_err(|e| VoiceError::Session(format!("failed to subscribe: {}", e)))?;

        Ok(EventStream {
            subscriber,
            session_id: self.session_id.clone(),
        })
    }

    /// Flush and release the connection. Idempotent; the underlying
    /// connection cleans up on drop.
    pub async fn close(&self) -> Result<(), VoiceError> {
        info!("Closing transport connection");

        self.client
            .flush()
            .await
            .map_err(|e| VoiceError::Session(format!("failed to flush: {}", e)))?;

        Ok(())
    }
}

/// Ordered stream of typed server events for one session.
pub struct EventStream {
    subscriber: async_nats::Subscriber,
    session_id: String,
}

impl EventStream {
    /// Next event in server-emission order.
    ///
    /// Returns `None` when the subscription ends. Malformed payloads are
    /// surfaced as `Decode` errors; the session decides termination
    /// policy.
    pub async fn next(&mut self) -> Option<Result<ServerEvent, VoiceError>> {
        while let Some(msg) = self.subscriber.next().await {
            let parsed = match serde_json::from_slice::<ServerEventMessage>(&msg.payload) {
                Ok(parsed) => parsed,
                Err(e) => {
                    return Some(Err(VoiceError::Decode(format!(
                        "malformed server event: {}",
                        e
                    ))));
                }
            };

            // Other sessions' events share nothing with us
            if parsed.session_id() != self.session_id {
                warn!(
                    "Dropping event for foreign session {}",
                    parsed.session_id()
                );
                continue;
            }

            return Some(map_event(parsed));
        }

        None
    }
}

fn map_event(message: ServerEventMessage) -> Result<ServerEvent, VoiceError> {
    match message {
        ServerEventMessage::AudioChunk {
            pcm,
            sample_rate,
            channels,
            ..
        } => {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(&pcm)
                .map_err(|e| VoiceError::Decode(format!("invalid base64 audio: {}", e)))?;

            Ok(ServerEvent::Audio {
                pcm: bytes,
                sample_rate,
                channels,
            })
        }
        ServerEventMessage::InputTranscript { text, .. } => {
            Ok(ServerEvent::InputTranscript { text })
        }
        ServerEventMessage::OutputTranscript { text, .. } => {
            Ok(ServerEvent::OutputTranscript { text })
        }
        ServerEventMessage::Interrupted { .. } => Ok(ServerEvent::Interrupted),
        ServerEventMessage::TurnComplete { .. } => Ok(ServerEvent::TurnComplete),
        ServerEventMessage::Closed { .. } => Ok(ServerEvent::Closed),
        ServerEventMessage::Error { message, .. } => Ok(ServerEvent::Error { message }),
    }
}
