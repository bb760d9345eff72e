//! Capture mode: record the caller and play a fixed greeting.
//!
//! No speech service is involved. On `start` the greeting clip is sent back
//! as one media frame and `call_<streamSid>.wav` is created; inbound audio
//! accumulates in memory and is written out when the stream ends.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::core::codec::{self, AudioCaptureBuffer};
use crate::core::telephony::{MediaPayload, ProviderEvent, ProviderOutbound, Track};
use crate::errors::{FrameError, RelayError, RelayResult};
use crate::state::AppState;

use super::{CHANNEL_BUFFER_SIZE, spawn_provider_writer};

/// Caller audio recorder for one call.
#[derive(Debug)]
pub struct CallRecorder {
    dir: PathBuf,
    stream_sid: Option<String>,
    file: Option<(File, PathBuf)>,
    buffer: AudioCaptureBuffer,
}

impl CallRecorder {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            stream_sid: None,
            file: None,
            buffer: AudioCaptureBuffer::new(),
        }
    }

    /// Path of the capture file for `stream_sid`.
    pub fn capture_path(dir: &Path, stream_sid: &str) -> PathBuf {
        dir.join(format!("call_{stream_sid}.wav"))
    }

    /// Create the capture file and reset the buffer.
    pub async fn start(&mut self, stream_sid: &str) -> RelayResult<()> {
        let path = Self::capture_path(&self.dir, stream_sid);
        let file = File::create(&path).await?;
        info!(path = %path.display(), "Created capture file");

        self.stream_sid = Some(stream_sid.to_string());
        self.file = Some((file, path));
        self.buffer = AudioCaptureBuffer::new();
        Ok(())
    }

    /// Append one inbound chunk. Undecodable payloads are rejected.
    pub fn record(&mut self, media: &MediaPayload) -> Result<(), FrameError> {
        if media.track != Track::Inbound {
            return Ok(());
        }
        let bytes = codec::decode(&media.payload)?;
        self.buffer.append(&bytes);
        debug!(total = self.buffer.len(), "Appended audio chunk");
        Ok(())
    }

    pub fn stream_sid(&self) -> Option<&str> {
        self.stream_sid.as_deref()
    }

    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Write `header ++ data` if anything was recorded.
    ///
    /// Returns the path written, if any.
    pub async fn finish(self) -> RelayResult<Option<PathBuf>> {
        let Some((mut file, path)) = self.file else {
            return Ok(None);
        };
        if self.buffer.is_empty() {
            return Ok(None);
        }

        file.write_all(&self.buffer.into_container()).await?;
        file.flush().await?;
        info!(path = %path.display(), "Saved call audio");
        Ok(Some(path))
    }
}

/// Run one captured call until the provider ends it.
pub async fn handle_capture_socket(socket: WebSocket, state: Arc<AppState>) {
    info!("Capture stream connection established");

    let cancel = CancellationToken::new();
    let (sender, mut receiver) = socket.split();
    let (provider_tx, provider_rx) = mpsc::channel::<ProviderOutbound>(CHANNEL_BUFFER_SIZE);
    let writer = spawn_provider_writer(sender, provider_rx, cancel.clone());

    let mut recorder = CallRecorder::new(&state.config.capture_dir);

    let result: RelayResult<()> = async {
        loop {
            let frame = tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                frame = receiver.next() => frame,
            };

            let text = match frame {
                Some(Ok(Message::Text(text))) => text,
                Some(Ok(Message::Close(_))) | None => return Ok(()),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
            };

            match ProviderEvent::parse(text.as_str()) {
                Ok(ProviderEvent::Start { start }) => {
                    recorder.start(&start.stream_sid).await?;
                    if let Some(payload) = &state.greeting_payload {
                        provider_tx
                            .send(ProviderOutbound::media(start.stream_sid.clone(), payload.clone()))
                            .await
                            .map_err(|_| RelayError::ProviderClosed)?;
                        info!(stream_sid = %start.stream_sid, "Sent greeting clip");
                    }
                }
                Ok(ProviderEvent::Media { media }) => {
                    if let Err(e) = recorder.record(&media) {
                        warn!("Dropping caller audio chunk: {}", e);
                    }
                }
                Ok(ProviderEvent::Stop { stream_sid }) => {
                    info!(stream_sid = %stream_sid, "Provider stopped the stream");
                    return Ok(());
                }
                Ok(event) => debug!(event = event.kind(), "Ignoring provider event"),
                Err(e) => warn!("Dropping provider frame: {}", e),
            }
        }
    }
    .await;

    if let Err(e) = result {
        error!("Capture stream terminated: {}", e);
    }

    let stream_sid = recorder.stream_sid().map(str::to_string);
    if let Err(e) = recorder.finish().await {
        error!(stream_sid = ?stream_sid, "Failed to save call audio: {}", e);
    }

    cancel.cancel();
    drop(provider_tx);
    let _ = writer.await;
    info!(stream_sid = ?stream_sid, "Capture stream connection terminated");
}
