//! Telephony provider (Twilio Media Streams) message schema.
//!
//! Each text frame on the provider socket is one JSON event. Inbound frames
//! are parsed into [`ProviderEvent`]; frames the relay sends back are built
//! from [`ProviderOutbound`].

mod messages;

pub use messages::{
    MarkPayload, MediaFormat, MediaPayload, OutboundMedia, ProviderEvent, ProviderOutbound,
    StartMetadata, Track,
};

use thiserror::Error;

/// Errors raised while handling provider frames.
#[derive(Debug, Error)]
pub enum TelephonyError {
    /// Frame is not valid JSON or has an unknown event tag
    #[error("Failed to parse provider event: {0}")]
    Parse(#[from] serde_json::Error),

    /// Outbound event could not be serialized
    #[error("Failed to serialize provider event: {0}")]
    Serialization(String),
}
