use std::path::PathBuf;

use super::{RelayMode, TlsConfig};

/// Pair up TLS certificate and key paths.
///
/// Both or neither must be set.
pub(super) fn validate_tls(
    cert_path: Option<String>,
    key_path: Option<String>,
) -> Result<Option<TlsConfig>, String> {
    match (cert_path, key_path) {
        (Some(cert), Some(key)) => Ok(Some(TlsConfig {
            cert_path: PathBuf::from(cert),
            key_path: PathBuf::from(key),
        })),
        (None, None) => Ok(None),
        (Some(_), None) => Err("TLS certificate path is set but TLS key path is missing".into()),
        (None, Some(_)) => Err("TLS key path is set but TLS certificate path is missing".into()),
    }
}

/// Relay mode talks to the speech service and needs its API key.
pub(super) fn validate_speech_credentials(
    mode: RelayMode,
    api_key: &Option<String>,
) -> Result<(), String> {
    if mode == RelayMode::Relay && api_key.as_deref().is_none_or(str::is_empty) {
        return Err(
            "OPENAI_API_KEY (or speech.api_key) is required when relay mode is 'relay'".into(),
        );
    }
    Ok(())
}

/// Temperature accepted by the speech service.
pub(super) fn validate_temperature(temperature: Option<f32>) -> Result<(), String> {
    match temperature {
        Some(t) if !(0.0..=2.0).contains(&t) => {
            Err(format!("Temperature must be between 0.0 and 2.0, got {t}"))
        }
        _ => Ok(()),
    }
}
