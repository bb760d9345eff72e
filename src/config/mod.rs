//! Configuration module for the relay gateway
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable access
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//!
//! # Example
//! ```rust,no_run
//! use callbridge_gateway::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable base
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::str::FromStr;

use crate::core::realtime::{OpenAIRealtimeVoice, ServerVadConfig, SpeechServiceConfig};

mod env;
mod merge;
mod validation;
mod yaml;

/// TLS configuration for HTTPS and WSS
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// What the `/stream` endpoint does with a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelayMode {
    /// Bridge the call to the speech service
    #[default]
    Relay,
    /// Record caller audio and play the greeting clip; no speech service
    Capture,
}

impl RelayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelayMode::Relay => "relay",
            RelayMode::Capture => "capture",
        }
    }
}

impl FromStr for RelayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "relay" => Ok(RelayMode::Relay),
            "capture" => Ok(RelayMode::Capture),
            other => Err(format!(
                "Unknown relay mode '{other}', expected 'relay' or 'capture'"
            )),
        }
    }
}

impl std::fmt::Display for RelayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server configuration
///
/// Contains all configuration needed to run the gateway:
/// - Server settings (host, port, TLS, public host for webhooks)
/// - Speech-service connection settings
/// - Relay mode and capture settings
///
/// Build it with [`ServerConfig::from_env`] or [`ServerConfig::from_file`];
/// struct-update syntax is unavailable because of the zeroizing `Drop`.
#[derive(Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // TLS configuration (optional)
    pub tls: Option<TlsConfig>,

    /// Public host name the provider reaches this server on, without scheme.
    /// Used to build the stream and status-callback URLs in webhook replies.
    pub public_host: Option<String>,

    // Speech service
    /// OpenAI API key for the Realtime API
    pub openai_api_key: Option<String>,
    pub realtime_url: String,
    pub realtime_model: String,
    pub realtime_voice: OpenAIRealtimeVoice,
    pub realtime_instructions: Option<String>,
    pub realtime_temperature: Option<f32>,
    pub turn_detection: ServerVadConfig,

    // Relay mode
    pub relay_mode: RelayMode,
    /// Directory where capture mode writes `call_<streamSid>.wav`
    pub capture_dir: PathBuf,
    /// WAV clip played to the caller in capture mode
    pub greeting_clip: PathBuf,
}

/// Implement Drop to zeroize secret fields when ServerConfig is dropped.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut key) = self.openai_api_key {
            key.zeroize();
        }
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field("public_host", &self.public_host)
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("realtime_url", &self.realtime_url)
            .field("realtime_model", &self.realtime_model)
            .field("realtime_voice", &self.realtime_voice)
            .field("relay_mode", &self.relay_mode)
            .field("capture_dir", &self.capture_dir)
            .field("greeting_clip", &self.greeting_clip)
            .finish_non_exhaustive()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// `.env` is loaded by `main` before this is called, so its values are
    /// visible here as ordinary environment variables.
    ///
    /// # Errors
    /// Returns an error if a variable has an invalid format or validation
    /// fails (missing API key in relay mode, unpaired TLS paths, unknown mode).
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        merge::merge_config(None)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        merge::merge_config(Some(yaml_config))
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if TLS is enabled
    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    /// Connection settings for one speech-service session.
    pub fn speech_config(&self) -> SpeechServiceConfig {
        SpeechServiceConfig {
            api_key: self.openai_api_key.clone().unwrap_or_default(),
            url: self.realtime_url.clone(),
            model: self.realtime_model.clone(),
            voice: self.realtime_voice,
            instructions: self.realtime_instructions.clone(),
            temperature: self.realtime_temperature,
            turn_detection: self.turn_detection.clone(),
        }
    }
}
