use std::path::Path;
use std::sync::Arc;

use crate::config::{RelayMode, ServerConfig};
use crate::core::codec;
use crate::errors::RelayResult;

/// Application state shared by all handlers
pub struct AppState {
    pub config: ServerConfig,
    /// Greeting clip as a ready-to-send media payload (capture mode only)
    pub greeting_payload: Option<String>,
}

impl AppState {
    /// Build the state, loading the greeting clip when capture mode is on.
    ///
    /// # Errors
    /// Fails if the clip cannot be read or has no valid WAV header.
    pub async fn new(config: ServerConfig) -> RelayResult<Arc<Self>> {
        let greeting_payload = match config.relay_mode {
            RelayMode::Capture => Some(load_greeting_clip(&config.greeting_clip).await?),
            RelayMode::Relay => None,
        };

        Ok(Arc::new(Self {
            config,
            greeting_payload,
        }))
    }
}

/// Read a WAV clip, drop its header and encode the µ-law body for the wire.
pub async fn load_greeting_clip(path: &Path) -> RelayResult<String> {
    let bytes = tokio::fs::read(path).await?;
    let audio = codec::strip_container_header(&bytes)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    tracing::info!(
        path = %path.display(),
        bytes = audio.len(),
        "Loaded greeting clip"
    );
    Ok(codec::encode(audio))
}
