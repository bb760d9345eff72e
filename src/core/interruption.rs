//! Barge-in coordination between the provider and the speech service.
//!
//! [`InterruptionCoordinator`] applies every event from either socket to the
//! shared [`CallSession`] and emits the resulting messages on the other
//! socket. State is Idle or Speaking (see [`CoordinatorState`]):
//!
//! - AI audio is forwarded to the provider followed by a mark; the mark token
//!   is queued until the provider acknowledges playback.
//! - Caller speech while marks are pending truncates the in-flight item on
//!   the speech service and then clears the provider's playback buffer.
//!
//! Session updates happen under the lock; sends happen after it is released.
//!
//! [`CallSession`]: crate::core::session::CallSession
//! [`CoordinatorState`]: crate::core::session::CoordinatorState

use std::ops::ControlFlow;

use tokio::sync::mpsc;

use crate::core::realtime::{SpeechServiceEvent, SpeechServiceHandle};
use crate::core::session::SharedCallSession;
use crate::core::telephony::{MediaPayload, ProviderEvent, ProviderOutbound, StartMetadata, Track};
use crate::errors::{RelayError, RelayResult};

/// Per-call coordinator. Cheap to clone; clones share the session.
#[derive(Debug, Clone)]
pub struct InterruptionCoordinator {
    session: SharedCallSession,
    speech: SpeechServiceHandle,
    provider_tx: mpsc::Sender<ProviderOutbound>,
}

impl InterruptionCoordinator {
    pub fn new(
        session: SharedCallSession,
        speech: SpeechServiceHandle,
        provider_tx: mpsc::Sender<ProviderOutbound>,
    ) -> Self {
        Self {
            session,
            speech,
            provider_tx,
        }
    }

    pub fn session(&self) -> &SharedCallSession {
        &self.session
    }

    // =========================================================================
    // Provider side
    // =========================================================================

    /// Apply one provider event. `Break` means the provider ended the stream.
    pub async fn on_provider_event(&self, event: ProviderEvent) -> RelayResult<ControlFlow<()>> {
        match event {
            ProviderEvent::Connected { protocol, version } => {
                tracing::debug!(?protocol, ?version, "Provider connected");
            }
            ProviderEvent::Start { start } => self.on_start(&start),
            ProviderEvent::Media { media } => self.on_media(&media).await?,
            ProviderEvent::Mark { mark } => self.on_mark(&mark.name),
            ProviderEvent::Stop { stream_sid } => {
                tracing::info!(stream_sid = %stream_sid, "Provider stopped the stream");
                return Ok(ControlFlow::Break(()));
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    pub fn on_start(&self, start: &StartMetadata) {
        self.session
            .lock()
            .start(start.stream_sid.clone(), start.call_sid.clone());
        tracing::info!(
            stream_sid = %start.stream_sid,
            call_sid = ?start.call_sid,
            "Media stream started"
        );
    }

    /// Forward caller audio untouched. Outbound-track echoes are ignored.
    pub async fn on_media(&self, media: &MediaPayload) -> RelayResult<()> {
        if media.track != Track::Inbound {
            return Ok(());
        }
        self.speech.forward_caller_audio(&media.payload).await?;
        Ok(())
    }

    pub fn on_mark(&self, name: &str) {
        let acked = self.session.lock().acknowledge_mark();
        match acked {
            Some(expected) if expected != name => {
                tracing::debug!(expected = %expected, received = %name, "Mark acknowledged out of order");
            }
            Some(_) => tracing::debug!(mark = %name, "Mark acknowledged"),
            None => tracing::debug!(mark = %name, "Mark acknowledged with nothing pending"),
        }
    }

    // =========================================================================
    // Speech-service side
    // =========================================================================

    /// Apply one speech-service event.
    pub async fn on_speech_event(&self, event: SpeechServiceEvent) -> RelayResult<()> {
        match event {
            SpeechServiceEvent::AudioDelta {
                payload,
                item_id,
                timestamp,
            } => self.on_audio_delta(payload, &item_id, timestamp).await,
            SpeechServiceEvent::SpeechStarted => self.on_speech_started().await,
            SpeechServiceEvent::Other(_) => Ok(()),
        }
    }

    /// Forward one AI chunk as provider `media` followed by its `mark`.
    pub async fn on_audio_delta(
        &self,
        payload: String,
        item_id: &str,
        timestamp: Option<u64>,
    ) -> RelayResult<()> {
        let ticket = self.session.lock().record_audio_delta(item_id, timestamp);
        let Some(ticket) = ticket else {
            tracing::warn!(item_id = %item_id, "Dropping AI audio received before stream start");
            return Ok(());
        };

        self.send_to_provider(ProviderOutbound::media(ticket.stream_id.clone(), payload))
            .await?;
        self.send_to_provider(ProviderOutbound::mark(ticket.stream_id, ticket.mark))
            .await
    }

    /// Caller barge-in: truncate then clear, only if audio is pending.
    pub async fn on_speech_started(&self) -> RelayResult<()> {
        let interruption = self.session.lock().take_interruption();
        let Some(interruption) = interruption else {
            tracing::debug!("Speech started with no pending playback");
            return Ok(());
        };

        tracing::info!(
            stream_sid = %interruption.stream_id,
            item_id = %interruption.item_id,
            "Caller interrupted, cancelling playback"
        );
        self.speech.send_truncate(&interruption.item_id).await?;
        self.send_to_provider(ProviderOutbound::clear(interruption.stream_id))
            .await
    }

    async fn send_to_provider(&self, message: ProviderOutbound) -> RelayResult<()> {
        self.provider_tx
            .send(message)
            .await
            .map_err(|_| RelayError::ProviderClosed)
    }
}
