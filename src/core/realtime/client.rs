//! OpenAI Realtime API WebSocket client.
//!
//! One connection is opened per call. The connection is split in two:
//!
//! - [`SpeechServiceHandle`]: a cloneable sender. Outbound events go through
//!   an mpsc channel into a writer task that owns the WebSocket sink, so
//!   callers never contend on the socket.
//! - [`SpeechEventStream`]: the read half, decoded into
//!   [`SpeechServiceEvent`]s.
//!
//! There is no reconnection. When the socket fails the writer task cancels
//! the call's [`CancellationToken`] and the relay tears the call down.

use std::time::Duration;

use futures::stream::SplitStream;
use futures::{SinkExt, Stream, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use url::Url;

use super::config::SpeechServiceConfig;
use super::messages::{ClientEvent, ServerEvent, SessionConfig, SpeechServiceEvent};
use super::{RealtimeError, RealtimeResult};

/// Upper bound on sending the close frame at teardown.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Channel capacity for outbound speech-service events.
const WS_CHANNEL_CAPACITY: usize = 256;

/// Read half of a live speech-service connection.
pub type SpeechServiceSocket = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

// =============================================================================
// Outbound handle
// =============================================================================

/// Cloneable sender for speech-service events.
#[derive(Debug, Clone)]
pub struct SpeechServiceHandle {
    tx: mpsc::Sender<ClientEvent>,
}

impl SpeechServiceHandle {
    /// Wrap the sending side of a writer channel.
    pub fn new(tx: mpsc::Sender<ClientEvent>) -> Self {
        Self { tx }
    }

    async fn send(&self, event: ClientEvent) -> RealtimeResult<()> {
        self.tx
            .send(event)
            .await
            .map_err(|_| RealtimeError::NotConnected)
    }

    /// Declare µ-law audio, voice and server VAD for this call.
    pub async fn configure_session(&self, config: &SpeechServiceConfig) -> RealtimeResult<()> {
        self.send(ClientEvent::SessionUpdate {
            session: SessionConfig::for_call(config),
        })
        .await
    }

    /// Ask the model to speak first.
    pub async fn start_conversation(&self) -> RealtimeResult<()> {
        self.send(ClientEvent::ResponseCreate).await
    }

    /// Forward one caller chunk, payload untouched.
    pub async fn forward_caller_audio(&self, payload: &str) -> RealtimeResult<()> {
        self.send(ClientEvent::audio_append(payload)).await
    }

    /// Truncate the response item that was playing when the caller barged in.
    pub async fn send_truncate(&self, item_id: &str) -> RealtimeResult<()> {
        self.send(ClientEvent::truncate(item_id)).await
    }
}

// =============================================================================
// Inbound stream
// =============================================================================

/// Decoded view of the speech-service read half.
pub struct SpeechEventStream<S> {
    inner: S,
}

impl<S> SpeechEventStream<S>
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// Next relay-relevant event.
    ///
    /// Returns `None` once the service closes the socket. Frames that fail to
    /// decode are logged and skipped; only transport errors are returned.
    pub async fn next_event(&mut self) -> Option<RealtimeResult<SpeechServiceEvent>> {
        loop {
            match self.inner.next().await? {
                Ok(Message::Text(text)) => match serde_json::from_str::<ServerEvent>(&text) {
                    Ok(ServerEvent::Error { error }) => {
                        tracing::error!(
                            error_type = %error.error_type,
                            code = ?error.code,
                            "Speech service error: {}",
                            error.message
                        );
                        return Some(Ok(SpeechServiceEvent::Other(text.to_string())));
                    }
                    Ok(event) => {
                        return Some(Ok(SpeechServiceEvent::from_server_event(
                            event,
                            text.as_str(),
                        )));
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse server event: {} - {}", e, text.as_str());
                    }
                },
                Ok(Message::Close(frame)) => {
                    tracing::info!(?frame, "Speech service closed the connection");
                    return None;
                }
                Ok(_) => {}
                Err(e) => return Some(Err(RealtimeError::WebSocketError(e.to_string()))),
            }
        }
    }
}

// =============================================================================
// Connection
// =============================================================================

/// A connected, configured speech-service session.
pub struct SpeechServiceClient {
    handle: SpeechServiceHandle,
    events: SpeechEventStream<SpeechServiceSocket>,
    writer: JoinHandle<()>,
}

impl SpeechServiceClient {
    /// Open the socket, start the writer task and send the initial
    /// `session.update` followed by `response.create`.
    ///
    /// `cancel` is cancelled by the writer task if a write fails, and stops
    /// the writer (after a close frame) when cancelled from outside.
    pub async fn connect(
        config: &SpeechServiceConfig,
        cancel: CancellationToken,
    ) -> RealtimeResult<Self> {
        if config.api_key.is_empty() {
            return Err(RealtimeError::InvalidConfiguration(
                "API key is required".to_string(),
            ));
        }

        let url = build_ws_url(config)?;
        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| RealtimeError::InvalidConfiguration(e.to_string()))?;
        let auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|e| RealtimeError::InvalidConfiguration(e.to_string()))?;
        request.headers_mut().insert("Authorization", auth);
        request
            .headers_mut()
            .insert("OpenAI-Beta", HeaderValue::from_static("realtime=v1"));

        let (ws_stream, _response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(connect_error)?;

        tracing::info!(model = %config.model, "Connected to OpenAI Realtime API");

        let (mut ws_sink, ws_stream) = ws_stream.split();
        let (tx, mut rx) = mpsc::channel::<ClientEvent>(WS_CHANNEL_CAPACITY);

        let writer = tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = cancel.cancelled() => break,
                    event = rx.recv() => match event {
                        Some(event) => event,
                        None => break,
                    },
                };
                let json = match serde_json::to_string(&event) {
                    Ok(j) => j,
                    Err(e) => {
                        tracing::error!("Failed to serialize event: {}", e);
                        continue;
                    }
                };
                let sent = tokio::select! {
                    _ = cancel.cancelled() => break,
                    sent = ws_sink.send(Message::Text(json.into())) => sent,
                };
                if let Err(e) = sent {
                    tracing::error!("Failed to send to speech service: {}", e);
                    cancel.cancel();
                    return;
                }
            }
            if tokio::time::timeout(CLOSE_TIMEOUT, ws_sink.send(Message::Close(None)))
                .await
                .is_err()
            {
                tracing::warn!("Speech service did not accept close frame in time");
            }
            tracing::debug!("Speech service writer finished");
        });

        let handle = SpeechServiceHandle::new(tx);
        handle.configure_session(config).await?;
        handle.start_conversation().await?;

        Ok(Self {
            handle,
            events: SpeechEventStream::new(ws_stream),
            writer,
        })
    }

    pub fn into_parts(
        self,
    ) -> (
        SpeechServiceHandle,
        SpeechEventStream<SpeechServiceSocket>,
        JoinHandle<()>,
    ) {
        (self.handle, self.events, self.writer)
    }
}

fn build_ws_url(config: &SpeechServiceConfig) -> RealtimeResult<Url> {
    Url::parse_with_params(&config.url, &[("model", config.model.as_str())])
        .map_err(|e| RealtimeError::InvalidConfiguration(format!("invalid url: {e}")))
}

fn connect_error(error: tungstenite::Error) -> RealtimeError {
    match &error {
        tungstenite::Error::Http(response)
            if response.status() == tungstenite::http::StatusCode::UNAUTHORIZED =>
        {
            RealtimeError::AuthenticationFailed("speech service rejected the API key".to_string())
        }
        _ => RealtimeError::ConnectionFailed(error.to_string()),
    }
}
