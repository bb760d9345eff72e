//! OpenAI Realtime API WebSocket message types.
//!
//! All events are JSON-encoded and sent over WebSocket.
//!
//! # Protocol Overview
//!
//! Client events (sent to server):
//! - session.update - Declare audio formats, voice and turn detection
//! - response.create - Ask the model to start speaking
//! - input_audio_buffer.append - Append caller audio
//! - conversation.item.truncate - Drop unplayed audio of an interrupted item
//!
//! Server events acted on by the relay:
//! - response.audio.delta - Synthesized audio chunk
//! - input_audio_buffer.speech_started - Caller started speaking
//!
//! Every other server event is accepted and ignored.

use serde::{Deserialize, Serialize};

use super::RealtimeError;
use super::config::{G711_ULAW_FORMAT, ServerVadConfig, SpeechServiceConfig};

// =============================================================================
// Session Configuration
// =============================================================================

/// Session configuration for OpenAI Realtime API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Response modalities (text, audio)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modalities: Option<Vec<String>>,

    /// System instructions for the assistant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    /// Voice for audio output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,

    /// Input audio format
    pub input_audio_format: String,

    /// Output audio format
    pub output_audio_format: String,

    /// Turn detection configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_detection: Option<TurnDetection>,

    /// Temperature for response generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl SessionConfig {
    /// Session used for every relayed call: µ-law both ways, server VAD.
    pub fn for_call(config: &SpeechServiceConfig) -> Self {
        Self {
            modalities: Some(vec!["text".to_string(), "audio".to_string()]),
            instructions: config.instructions.clone(),
            voice: Some(config.voice.as_str().to_string()),
            input_audio_format: G711_ULAW_FORMAT.to_string(),
            output_audio_format: G711_ULAW_FORMAT.to_string(),
            turn_detection: Some(TurnDetection::from(&config.turn_detection)),
            temperature: config.temperature,
        }
    }
}

/// Turn detection configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TurnDetection {
    /// Server-side VAD
    #[serde(rename = "server_vad")]
    ServerVad {
        #[serde(skip_serializing_if = "Option::is_none")]
        threshold: Option<f32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        prefix_padding_ms: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        silence_duration_ms: Option<u32>,
    },
}

impl From<&ServerVadConfig> for TurnDetection {
    fn from(vad: &ServerVadConfig) -> Self {
        TurnDetection::ServerVad {
            threshold: vad.threshold,
            prefix_padding_ms: vad.prefix_padding_ms,
            silence_duration_ms: vad.silence_duration_ms,
        }
    }
}

// =============================================================================
// Client Events (sent to server)
// =============================================================================

/// Client events sent to the OpenAI Realtime API.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Update session configuration
    #[serde(rename = "session.update")]
    SessionUpdate { session: SessionConfig },

    /// Ask the model to respond; opens the conversation
    #[serde(rename = "response.create")]
    ResponseCreate,

    /// Append audio to input buffer
    #[serde(rename = "input_audio_buffer.append")]
    InputAudioBufferAppend {
        /// Base64 µ-law audio, exactly as received from the provider
        audio: String,
    },

    /// Truncate a conversation item
    #[serde(rename = "conversation.item.truncate")]
    ConversationItemTruncate {
        item_id: String,
        content_index: u32,
        audio_end_ms: u32,
    },
}

impl ClientEvent {
    /// Append event for an already encoded caller chunk.
    pub fn audio_append(payload: impl Into<String>) -> Self {
        ClientEvent::InputAudioBufferAppend {
            audio: payload.into(),
        }
    }

    /// Truncate the first content part of `item_id` at position 0.
    pub fn truncate(item_id: impl Into<String>) -> Self {
        ClientEvent::ConversationItemTruncate {
            item_id: item_id.into(),
            content_index: 0,
            audio_end_ms: 0,
        }
    }
}

// =============================================================================
// Server Events (received from server)
// =============================================================================

/// Server events received from the OpenAI Realtime API.
///
/// Only the events the relay logs or acts on are modeled; everything else,
/// including session and response lifecycle events, lands in
/// `Unrecognized` whatever its fields look like.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Error occurred
    #[serde(rename = "error")]
    Error { error: ApiError },

    /// Speech started (VAD detected speech)
    #[serde(rename = "input_audio_buffer.speech_started")]
    SpeechStarted {
        #[serde(default)]
        audio_start_ms: Option<u64>,
        #[serde(default)]
        item_id: Option<String>,
    },

    /// Audio delta (audio data chunk)
    #[serde(rename = "response.audio.delta", alias = "response.output_audio.delta")]
    AudioDelta {
        #[serde(default)]
        response_id: Option<String>,
        item_id: String,
        /// Base64 µ-law audio delta
        delta: String,
        /// Service-side timestamp of the chunk, when provided
        #[serde(default)]
        timestamp: Option<u64>,
    },

    /// Any other event type
    #[serde(other)]
    Unrecognized,
}

/// API error information.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    #[serde(rename = "type")]
    pub error_type: String,
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
}

// =============================================================================
// Relay view of server events
// =============================================================================

/// The speech-service events the relay distinguishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechServiceEvent {
    /// Synthesized audio for response item `item_id`
    AudioDelta {
        payload: String,
        item_id: String,
        timestamp: Option<u64>,
    },

    /// Caller started speaking
    SpeechStarted,

    /// Anything else, kept verbatim
    Other(String),
}

impl SpeechServiceEvent {
    /// Decode one text frame from the speech service.
    ///
    /// Unknown event types decode to `Other`; only invalid JSON or a known
    /// event with missing fields is an error.
    pub fn decode(text: &str) -> Result<Self, RealtimeError> {
        let event: ServerEvent = serde_json::from_str(text)
            .map_err(|e| RealtimeError::SerializationError(e.to_string()))?;
        Ok(Self::from_server_event(event, text))
    }

    pub(crate) fn from_server_event(event: ServerEvent, raw: &str) -> Self {
        match event {
            ServerEvent::AudioDelta {
                delta,
                item_id,
                timestamp,
                ..
            } => SpeechServiceEvent::AudioDelta {
                payload: delta,
                item_id,
                timestamp,
            },
            ServerEvent::SpeechStarted { .. } => SpeechServiceEvent::SpeechStarted,
            _ => SpeechServiceEvent::Other(raw.to_string()),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
