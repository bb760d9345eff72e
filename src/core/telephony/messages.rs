//! Twilio Media Streams WebSocket message types.
//!
//! # Protocol Overview
//!
//! Provider events (received from the provider, one per text frame):
//! - connected - Socket handshake completed
//! - start - Stream metadata (stream SID, call SID, tracks)
//! - media - One chunk of base64 µ-law audio
//! - mark - A previously sent mark finished playing
//! - stop - Stream ended
//!
//! Relay events (sent to the provider):
//! - media - Audio to play to the caller
//! - mark - Ask the provider to echo a token once preceding audio has played
//! - clear - Drop all buffered, not yet played audio

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::TelephonyError;

// =============================================================================
// Inbound events
// =============================================================================

/// Events received from the telephony provider.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum ProviderEvent {
    /// First frame on every stream
    Connected {
        #[serde(default)]
        protocol: Option<String>,
        #[serde(default)]
        version: Option<String>,
    },

    /// Stream started
    Start { start: StartMetadata },

    /// Audio chunk
    Media { media: MediaPayload },

    /// Playback acknowledgment for a mark sent earlier
    Mark { mark: MarkPayload },

    /// Stream stopped
    Stop {
        #[serde(rename = "streamSid")]
        stream_sid: String,
    },
}

impl ProviderEvent {
    /// Parse one inbound text frame.
    ///
    /// Invalid JSON and unknown `event` tags both surface as
    /// [`TelephonyError::Parse`].
    pub fn parse(text: &str) -> Result<Self, TelephonyError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Event tag, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::Start { .. } => "start",
            Self::Media { .. } => "media",
            Self::Mark { .. } => "mark",
            Self::Stop { .. } => "stop",
        }
    }
}

/// Metadata carried by the `start` event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StartMetadata {
    /// Stream SID, used to address every outbound message
    #[serde(rename = "streamSid")]
    pub stream_sid: String,
    /// Call SID
    #[serde(rename = "callSid", default)]
    pub call_sid: Option<String>,
    /// Tracks included in the stream
    #[serde(default)]
    pub tracks: Vec<String>,
    /// Audio format of the stream
    #[serde(rename = "mediaFormat", default)]
    pub media_format: Option<MediaFormat>,
    /// Parameters passed through from the call-control document
    #[serde(rename = "customParameters", default)]
    pub custom_parameters: HashMap<String, String>,
}

/// Audio format announced at stream start.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MediaFormat {
    pub encoding: String,
    #[serde(rename = "sampleRate")]
    pub sample_rate: u32,
    pub channels: u16,
}

/// Direction of an audio track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Track {
    /// Caller audio
    Inbound,
    /// Audio played to the caller
    Outbound,
}

/// Audio chunk inside a `media` event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MediaPayload {
    pub track: Track,
    /// Base64 µ-law audio
    pub payload: String,
    /// Milliseconds since stream start
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub chunk: Option<String>,
}

/// Mark token, both directions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkPayload {
    pub name: String,
}

// =============================================================================
// Outbound events
// =============================================================================

/// Events sent to the telephony provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum ProviderOutbound {
    /// Audio to play
    Media {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        media: OutboundMedia,
    },

    /// Playback acknowledgment request
    Mark {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        mark: MarkPayload,
    },

    /// Discard buffered audio
    Clear {
        #[serde(rename = "streamSid")]
        stream_sid: String,
    },
}

/// Audio carried by an outbound `media` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMedia {
    /// Base64 µ-law audio
    pub payload: String,
}

impl ProviderOutbound {
    pub fn media(stream_sid: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::Media {
            stream_sid: stream_sid.into(),
            media: OutboundMedia {
                payload: payload.into(),
            },
        }
    }

    pub fn mark(stream_sid: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Mark {
            stream_sid: stream_sid.into(),
            mark: MarkPayload { name: name.into() },
        }
    }

    pub fn clear(stream_sid: impl Into<String>) -> Self {
        Self::Clear {
            stream_sid: stream_sid.into(),
        }
    }

    /// Serialize to the text frame the provider expects.
    pub fn to_json(&self) -> Result<String, TelephonyError> {
        serde_json::to_string(self).map_err(|e| TelephonyError::Serialization(e.to_string()))
    }
}

// =============================================================================
// Tests
// =============================================================================
