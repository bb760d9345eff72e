//! Telephony webhook handlers
//!
//! The provider calls `/incomingCall` when a call arrives and expects a
//! TwiML document telling it where to stream the call's audio. Stream
//! lifecycle notifications arrive on `/streamStatus`.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::state::AppState;

/// Build the call-control document pointing the provider at this server.
///
/// Only the two addresses depend on `public_host`.
pub fn stream_twiml(public_host: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Response>
    <Connect>
        <Stream url="wss://{public_host}/stream" statusCallback="https://{public_host}/streamStatus" />
    </Connect>
    <Say>The stream has started.</Say>
</Response>"#
    )
}

/// Incoming call webhook
///
/// Responds with `text/xml` TwiML, or 503 when no public host is configured.
pub async fn incoming_call(State(state): State<Arc<AppState>>) -> Response {
    tracing::info!("Received incoming call");

    let Some(public_host) = state.config.public_host.as_deref() else {
        tracing::error!("PUBLIC_HOST is not configured, cannot answer incoming call");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            "public host not configured",
        )
            .into_response();
    };

    (
        [(header::CONTENT_TYPE, "text/xml")],
        stream_twiml(public_host),
    )
        .into_response()
}

/// Stream status callback
///
/// The body is form-encoded stream lifecycle data; it is only logged.
pub async fn stream_status(body: String) -> StatusCode {
    tracing::info!(status = %body, "Received stream status");
    StatusCode::OK
}
