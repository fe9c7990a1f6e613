use crate::session::{LiveSession, SessionConfig};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The single live session slot; at most one session is open at a time
    pub session: Arc<RwLock<Option<Arc<LiveSession>>>>,

    /// Template applied to every new session (transport URL, sample
    /// rates, recording path)
    pub defaults: Arc<SessionConfig>,
}

impl AppState {
    pub fn new(defaults: SessionConfig) -> Self {
        Self {
            session: Arc::new(RwLock::new(None)),
            defaults: Arc::new(defaults),
        }
    }
}
