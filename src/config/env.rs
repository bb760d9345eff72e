//! Environment variable access.
//!
//! Empty values count as unset so that `KEY=` in a `.env` file does not
//! override a default.

use std::env;
use std::str::FromStr;

pub(super) const HOST: &str = "HOST";
pub(super) const PORT: &str = "PORT";
pub(super) const TLS_CERT_PATH: &str = "TLS_CERT_PATH";
pub(super) const TLS_KEY_PATH: &str = "TLS_KEY_PATH";
pub(super) const PUBLIC_HOST: &str = "PUBLIC_HOST";
pub(super) const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub(super) const OPENAI_REALTIME_URL: &str = "OPENAI_REALTIME_URL";
pub(super) const OPENAI_REALTIME_MODEL: &str = "OPENAI_REALTIME_MODEL";
pub(super) const OPENAI_REALTIME_VOICE: &str = "OPENAI_REALTIME_VOICE";
pub(super) const OPENAI_REALTIME_INSTRUCTIONS: &str = "OPENAI_REALTIME_INSTRUCTIONS";
pub(super) const OPENAI_REALTIME_TEMPERATURE: &str = "OPENAI_REALTIME_TEMPERATURE";
pub(super) const RELAY_MODE: &str = "RELAY_MODE";
pub(super) const CAPTURE_DIR: &str = "CAPTURE_DIR";
pub(super) const GREETING_CLIP_PATH: &str = "GREETING_CLIP_PATH";

/// Every variable the configuration reads.
#[cfg(test)]
pub(super) const ALL: &[&str] = &[
    HOST,
    PORT,
    TLS_CERT_PATH,
    TLS_KEY_PATH,
    PUBLIC_HOST,
    OPENAI_API_KEY,
    OPENAI_REALTIME_URL,
    OPENAI_REALTIME_MODEL,
    OPENAI_REALTIME_VOICE,
    OPENAI_REALTIME_INSTRUCTIONS,
    OPENAI_REALTIME_TEMPERATURE,
    RELAY_MODE,
    CAPTURE_DIR,
    GREETING_CLIP_PATH,
];

/// Read a variable, treating empty or whitespace-only values as unset.
pub(super) fn var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read and parse a variable.
pub(super) fn parse<T>(key: &str) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(key) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("Invalid value for {key}: '{raw}' ({e})")),
        None => Ok(None),
    }
}
