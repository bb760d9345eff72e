//! Speech-service (OpenAI Realtime API) connection.
//!
//! This module owns everything about the second WebSocket of a call:
//! the event schema, the connection configuration and the client that
//! opens the socket and splits it into a sender handle and an event stream.
//!
//! # Audio Format
//!
//! G.711 µ-law at 8kHz in both directions. Payloads are forwarded to and
//! from the telephony provider as base64 text without transcoding.
//!
//! # Example
//!
//! ```rust,ignore
//! use callbridge_gateway::core::realtime::{SpeechServiceClient, SpeechServiceConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let config = SpeechServiceConfig {
//!     api_key: "sk-...".to_string(),
//!     ..Default::default()
//! };
//! let client = SpeechServiceClient::connect(&config, CancellationToken::new()).await?;
//! let (handle, mut events, _writer) = client.into_parts();
//!
//! handle.forward_caller_audio("AQ==").await?;
//! while let Some(event) = events.next_event().await {
//!     println!("{:?}", event?);
//! }
//! ```

mod client;
mod config;
mod messages;

pub use client::{SpeechEventStream, SpeechServiceClient, SpeechServiceHandle, SpeechServiceSocket};
pub use config::{
    DEFAULT_REALTIME_MODEL, G711_ULAW_FORMAT, OPENAI_REALTIME_URL, OpenAIRealtimeVoice,
    ServerVadConfig, SpeechServiceConfig,
};
pub use messages::{ClientEvent, ServerEvent, SessionConfig, SpeechServiceEvent, TurnDetection};

use thiserror::Error;

/// Errors that can occur on the speech-service connection.
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// Connection to the service failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Writer task is gone
    #[error("Not connected")]
    NotConnected,
}

/// Result type for speech-service operations.
pub type RealtimeResult<T> = Result<T, RealtimeError>;
