//! OpenAI Realtime API configuration types.
//!
//! This module contains the configuration used to open one speech-service
//! connection per call:
//! - Endpoint and model selection
//! - Voice selection
//! - Turn detection settings
//!
//! Audio format is not configurable: both directions always use G.711 µ-law
//! so that provider frames can be forwarded without transcoding.

use serde::{Deserialize, Serialize};

/// OpenAI Realtime API WebSocket endpoint.
pub const OPENAI_REALTIME_URL: &str = "wss://api.openai.com/v1/realtime";

/// Default Realtime model.
pub const DEFAULT_REALTIME_MODEL: &str = "gpt-4o-realtime-preview";

/// Audio format name for G.711 µ-law, used for input and output.
pub const G711_ULAW_FORMAT: &str = "g711_ulaw";

// =============================================================================
// Voices
// =============================================================================

/// Available voices for OpenAI Realtime API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpenAIRealtimeVoice {
    /// Alloy voice (default)
    #[default]
    Alloy,
    Ash,
    Ballad,
    Coral,
    Echo,
    Sage,
    Shimmer,
    Verse,
}

impl OpenAIRealtimeVoice {
    /// Convert to the API parameter value.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alloy => "alloy",
            Self::Ash => "ash",
            Self::Ballad => "ballad",
            Self::Coral => "coral",
            Self::Echo => "echo",
            Self::Sage => "sage",
            Self::Shimmer => "shimmer",
            Self::Verse => "verse",
        }
    }

    /// Parse from string, with fallback to default.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "alloy" => Self::Alloy,
            "ash" => Self::Ash,
            "ballad" => Self::Ballad,
            "coral" => Self::Coral,
            "echo" => Self::Echo,
            "sage" => Self::Sage,
            "shimmer" => Self::Shimmer,
            "verse" => Self::Verse,
            _ => Self::default(),
        }
    }
}

impl std::fmt::Display for OpenAIRealtimeVoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Turn detection
// =============================================================================

/// Server-side voice activity detection tuning.
///
/// Every field is optional; unset fields are omitted from the session
/// update and the service defaults apply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerVadConfig {
    /// Activation threshold (0.0 to 1.0)
    #[serde(default)]
    pub threshold: Option<f32>,
    /// Amount of audio to include before voice detection (ms)
    #[serde(default)]
    pub prefix_padding_ms: Option<u32>,
    /// Silence duration before end of turn (ms)
    #[serde(default)]
    pub silence_duration_ms: Option<u32>,
}

// =============================================================================
// Connection configuration
// =============================================================================

/// Configuration for one speech-service connection.
#[derive(Clone)]
pub struct SpeechServiceConfig {
    /// API key for authentication
    pub api_key: String,
    /// WebSocket endpoint, without query string
    pub url: String,
    /// Model passed as the `model` query parameter
    pub model: String,
    /// Voice for synthesized audio
    pub voice: OpenAIRealtimeVoice,
    /// System instructions for the assistant
    pub instructions: Option<String>,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Server VAD tuning
    pub turn_detection: ServerVadConfig,
}

impl Default for SpeechServiceConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            url: OPENAI_REALTIME_URL.to_string(),
            model: DEFAULT_REALTIME_MODEL.to_string(),
            voice: OpenAIRealtimeVoice::default(),
            instructions: None,
            temperature: None,
            turn_detection: ServerVadConfig::default(),
        }
    }
}

impl std::fmt::Debug for SpeechServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechServiceConfig")
            .field("api_key", &"<redacted>")
            .field("url", &self.url)
            .field("model", &self.model)
            .field("voice", &self.voice)
            .field("instructions", &self.instructions)
            .field("temperature", &self.temperature)
            .field("turn_detection", &self.turn_detection)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_parsing() {
        assert_eq!(
            OpenAIRealtimeVoice::from_str_or_default("SHIMMER"),
            OpenAIRealtimeVoice::Shimmer
        );
        assert_eq!(
            OpenAIRealtimeVoice::from_str_or_default(" coral "),
            OpenAIRealtimeVoice::Coral
        );
        assert_eq!(
            OpenAIRealtimeVoice::from_str_or_default("unknown"),
            OpenAIRealtimeVoice::Alloy
        );
    }

    #[test]
    fn test_default_config() {
        let config = SpeechServiceConfig::default();
        assert_eq!(config.url, "wss://api.openai.com/v1/realtime");
        assert_eq!(config.model, DEFAULT_REALTIME_MODEL);
        assert_eq!(config.voice, OpenAIRealtimeVoice::Alloy);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = SpeechServiceConfig {
            api_key: "sk-secret".to_string(),
            ..Default::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
