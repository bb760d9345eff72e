use std::path::PathBuf;

use crate::core::realtime::{
    DEFAULT_REALTIME_MODEL, OPENAI_REALTIME_URL, OpenAIRealtimeVoice, ServerVadConfig,
};

use super::env;
use super::validation;
use super::yaml::YamlConfig;
use super::{RelayMode, ServerConfig};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_CAPTURE_DIR: &str = ".";
const DEFAULT_GREETING_CLIP: &str = "audio.wav";

/// Build the final configuration: defaults, then environment, then YAML.
pub(super) fn merge_config(
    yaml: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let yaml = yaml.unwrap_or_default();
    let server = yaml.server.unwrap_or_default();
    let tls = server.tls.unwrap_or_default();
    let speech = yaml.speech.unwrap_or_default();
    let vad = speech.turn_detection.unwrap_or_default();
    let relay = yaml.relay.unwrap_or_default();

    let host = server
        .host
        .or_else(|| env::var(env::HOST))
        .unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = match server.port {
        Some(port) => port,
        None => env::parse::<u16>(env::PORT)?.unwrap_or(DEFAULT_PORT),
    };

    let tls = validation::validate_tls(
        tls.cert_path.or_else(|| env::var(env::TLS_CERT_PATH)),
        tls.key_path.or_else(|| env::var(env::TLS_KEY_PATH)),
    )?;

    let public_host = server.public_host.or_else(|| env::var(env::PUBLIC_HOST));

    let openai_api_key = speech.api_key.or_else(|| env::var(env::OPENAI_API_KEY));
    let realtime_url = speech
        .url
        .or_else(|| env::var(env::OPENAI_REALTIME_URL))
        .unwrap_or_else(|| OPENAI_REALTIME_URL.to_string());
    let realtime_model = speech
        .model
        .or_else(|| env::var(env::OPENAI_REALTIME_MODEL))
        .unwrap_or_else(|| DEFAULT_REALTIME_MODEL.to_string());
    let realtime_voice = speech
        .voice
        .or_else(|| env::var(env::OPENAI_REALTIME_VOICE))
        .map(|v| OpenAIRealtimeVoice::from_str_or_default(&v))
        .unwrap_or_default();
    let realtime_instructions = speech
        .instructions
        .or_else(|| env::var(env::OPENAI_REALTIME_INSTRUCTIONS));
    let realtime_temperature = match speech.temperature {
        Some(t) => Some(t),
        None => env::parse::<f32>(env::OPENAI_REALTIME_TEMPERATURE)?,
    };
    validation::validate_temperature(realtime_temperature)?;

    let relay_mode = match relay.mode.or_else(|| env::var(env::RELAY_MODE)) {
        Some(mode) => mode.parse::<RelayMode>()?,
        None => RelayMode::default(),
    };
    validation::validate_speech_credentials(relay_mode, &openai_api_key)?;

    let capture_dir = PathBuf::from(
        relay
            .capture_dir
            .or_else(|| env::var(env::CAPTURE_DIR))
            .unwrap_or_else(|| DEFAULT_CAPTURE_DIR.to_string()),
    );
    let greeting_clip = PathBuf::from(
        relay
            .greeting_clip
            .or_else(|| env::var(env::GREETING_CLIP_PATH))
            .unwrap_or_else(|| DEFAULT_GREETING_CLIP.to_string()),
    );

    Ok(ServerConfig {
        host,
        port,
        tls,
        public_host,
        openai_api_key,
        realtime_url,
        realtime_model,
        realtime_voice,
        realtime_instructions,
        realtime_temperature,
        turn_detection: ServerVadConfig {
            threshold: vad.threshold,
            prefix_padding_ms: vad.prefix_padding_ms,
            silence_duration_ms: vad.silence_duration_ms,
        },
        relay_mode,
        capture_dir,
        greeting_clip,
    })
}
