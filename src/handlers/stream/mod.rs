//! Media stream WebSocket handler
//!
//! The telephony provider opens `GET /stream` once per call and sends the
//! call's audio as JSON text frames. Depending on the configured
//! [`RelayMode`] the socket is handed to:
//! - `relay` - bridges the call to the speech service with barge-in handling
//! - `capture` - records caller audio to disk and plays a greeting clip

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{Sink, SinkExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::RelayMode;
use crate::core::telephony::ProviderOutbound;
use crate::state::AppState;

mod capture;
mod relay;

pub use capture::{CallRecorder, handle_capture_socket};
pub use relay::handle_relay_socket;

/// Channel buffer size for frames queued towards the provider
pub(crate) const CHANNEL_BUFFER_SIZE: usize = 1024;

/// How long a writer waits for the socket to take its close frame
pub(crate) const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Maximum WebSocket frame size (10 MB)
const MAX_WS_FRAME_SIZE: usize = 10 * 1024 * 1024;

/// Maximum WebSocket message size (10 MB)
const MAX_WS_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

/// Media stream WebSocket handler
///
/// Upgrades the connection and dispatches it by relay mode.
pub async fn media_stream_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    let mode = state.config.relay_mode;
    info!(mode = %mode, "Media stream connection upgrade requested");

    ws.max_frame_size(MAX_WS_FRAME_SIZE)
        .max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket: WebSocket| async move {
            match mode {
                RelayMode::Relay => handle_relay_socket(socket, state).await,
                RelayMode::Capture => handle_capture_socket(socket, state).await,
            }
        })
}

/// Spawn the task that owns the provider sink.
///
/// Drains `rx` in order into the socket. A failed write cancels `cancel`;
/// cancellation or a closed channel sends a Close frame and ends the task.
/// Cancellation also interrupts a write the socket is not accepting, and the
/// Close frame is given up on after [`CLOSE_TIMEOUT`].
pub(crate) fn spawn_provider_writer<S>(
    mut sink: S,
    mut rx: mpsc::Receiver<ProviderOutbound>,
    cancel: CancellationToken,
) -> JoinHandle<()>
where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: std::fmt::Display,
{
    tokio::spawn(async move {
        loop {
            let outbound = tokio::select! {
                _ = cancel.cancelled() => break,
                outbound = rx.recv() => match outbound {
                    Some(outbound) => outbound,
                    None => break,
                },
            };
            let json = match outbound.to_json() {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize provider message: {}", e);
                    continue;
                }
            };
            let sent = tokio::select! {
                _ = cancel.cancelled() => break,
                sent = sink.send(Message::Text(json.into())) => sent,
            };
            if let Err(e) = sent {
                error!("Failed to send to provider: {}", e);
                cancel.cancel();
                return;
            }
        }
        if timeout(CLOSE_TIMEOUT, sink.send(Message::Close(None)))
            .await
            .is_err()
        {
            warn!("Provider socket did not accept close frame in time");
        }
    })
}
