pub mod client;
pub mod events;
pub mod messages;

pub use client::{EventStream, TransportClient};
pub use events::ServerEvent;
pub use messages::{AudioFrameMessage, ServerEventMessage, SessionSetupMessage};
