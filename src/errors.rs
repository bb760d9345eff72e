//! Call-level error types
//!
//! Errors that end one call. None of them ends the process: the relay logs
//! the error, tears down both connections and keeps serving other calls.

use thiserror::Error;

use crate::core::codec::CodecError;
use crate::core::realtime::RealtimeError;
use crate::core::telephony::TelephonyError;

/// Result type for relay operations
pub type RelayResult<T> = Result<T, RelayError>;

/// Fatal errors for a single call
#[derive(Error, Debug)]
pub enum RelayError {
    // ─────────────────────────────────────────────────────────────────────────────
    // Transport Errors
    // ─────────────────────────────────────────────────────────────────────────────

    /// Provider socket failed to read or write
    #[error("Provider transport error: {0}")]
    Transport(String),

    /// Provider writer task is gone, nothing more can be sent
    #[error("Provider connection closed")]
    ProviderClosed,

    /// Speech-service connection failed
    #[error("Speech service error: {0}")]
    SpeechService(#[from] RealtimeError),

    // ─────────────────────────────────────────────────────────────────────────────
    // Capture Errors
    // ─────────────────────────────────────────────────────────────────────────────

    /// Capture file could not be written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<axum::Error> for RelayError {
    fn from(err: axum::Error) -> Self {
        RelayError::Transport(err.to_string())
    }
}

/// Errors that are logged and dropped without ending the call
#[derive(Error, Debug)]
pub enum FrameError {
    #[error(transparent)]
    Telephony(#[from] TelephonyError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}
