//! Relay mode: one speech-service session per call.
//!
//! Per call this wires up:
//! - a writer task draining provider-bound frames into the provider socket,
//! - a speech-service connection with its own writer task,
//! - a shared [`CallSession`] driven by an [`InterruptionCoordinator`],
//! - two receive loops, one per socket, polled concurrently.
//!
//! When either loop ends or fails it cancels the call's token, which stops
//! the other loop and both writers, closing both connections.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::core::interruption::InterruptionCoordinator;
use crate::core::realtime::{SpeechEventStream, SpeechServiceClient};
use crate::core::session::CallSession;
use crate::core::telephony::{ProviderEvent, ProviderOutbound};
use crate::errors::RelayResult;
use crate::state::AppState;

use super::{CHANNEL_BUFFER_SIZE, spawn_provider_writer};

/// Run one relayed call until either side ends it.
pub async fn handle_relay_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = Uuid::new_v4();
    info!(%connection_id, "Media stream connection established");

    let cancel = CancellationToken::new();
    let (sender, mut receiver) = socket.split();
    let (provider_tx, provider_rx) = mpsc::channel::<ProviderOutbound>(CHANNEL_BUFFER_SIZE);
    let provider_writer = spawn_provider_writer(sender, provider_rx, cancel.clone());

    let client =
        match SpeechServiceClient::connect(&state.config.speech_config(), cancel.clone()).await {
            Ok(client) => client,
            Err(e) => {
                error!(%connection_id, "Failed to connect to speech service: {}", e);
                cancel.cancel();
                let _ = provider_writer.await;
                return;
            }
        };
    let (speech, mut events, speech_writer) = client.into_parts();

    let coordinator = InterruptionCoordinator::new(CallSession::shared(), speech, provider_tx);

    match run_call(&coordinator, &mut receiver, &mut events, &cancel).await {
        Ok(()) => info!(%connection_id, "Call ended"),
        Err(e) => error!(%connection_id, "Call terminated: {}", e),
    }

    // Cleanup
    cancel.cancel();
    let stream_sid = coordinator.session().lock().stream_id().map(str::to_string);
    drop(coordinator);
    let _ = provider_writer.await;
    let _ = speech_writer.await;

    info!(%connection_id, stream_sid = ?stream_sid, "Media stream connection terminated");
}

/// Run both receive loops until one of them ends.
///
/// The provider loop and the speech-service loop are polled concurrently, so
/// a stalled write on one side only holds up the loop that issued it. Each
/// loop cancels `cancel` when it exits, which stops the other one.
///
/// Returns `Ok` on an orderly end (provider `stop`, either side closing,
/// or cancellation) and the first fatal transport error otherwise.
pub async fn run_call<P, S>(
    coordinator: &InterruptionCoordinator,
    provider: &mut P,
    events: &mut SpeechEventStream<S>,
    cancel: &CancellationToken,
) -> RelayResult<()>
where
    P: Stream<Item = Result<Message, axum::Error>> + Unpin,
    S: Stream<
            Item = Result<
                tokio_tungstenite::tungstenite::Message,
                tokio_tungstenite::tungstenite::Error,
            >,
        > + Unpin,
{
    let (provider_result, speech_result) = tokio::join!(
        until_cancelled(cancel, provider_loop(coordinator, provider)),
        until_cancelled(cancel, speech_loop(coordinator, events)),
    );
    provider_result.and(speech_result)
}

/// Drive `fut` unless the call is cancelled first, then cancel the call.
async fn until_cancelled<F>(cancel: &CancellationToken, fut: F) -> RelayResult<()>
where
    F: Future<Output = RelayResult<()>>,
{
    let result = tokio::select! {
        _ = cancel.cancelled() => Ok(()),
        result = fut => result,
    };
    cancel.cancel();
    result
}

async fn provider_loop<P>(coordinator: &InterruptionCoordinator, provider: &mut P) -> RelayResult<()>
where
    P: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    loop {
        match provider.next().await {
            Some(Ok(Message::Text(text))) => match ProviderEvent::parse(text.as_str()) {
                Ok(event) => {
                    debug!(event = event.kind(), "Provider event");
                    if coordinator.on_provider_event(event).await?.is_break() {
                        return Ok(());
                    }
                }
                Err(e) => warn!("Dropping provider frame: {}", e),
            },
            Some(Ok(Message::Close(_))) | None => {
                info!("Provider closed the media stream");
                return Ok(());
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => return Err(e.into()),
        }
    }
}

async fn speech_loop<S>(
    coordinator: &InterruptionCoordinator,
    events: &mut SpeechEventStream<S>,
) -> RelayResult<()>
where
    S: Stream<
            Item = Result<
                tokio_tungstenite::tungstenite::Message,
                tokio_tungstenite::tungstenite::Error,
            >,
        > + Unpin,
{
    loop {
        match events.next_event().await {
            Some(Ok(event)) => coordinator.on_speech_event(event).await?,
            Some(Err(e)) => return Err(e.into()),
            None => {
                info!("Speech service ended the session");
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::realtime::{ClientEvent, SpeechServiceHandle};
    use crate::errors::RelayError;
    use futures::channel::mpsc as futures_mpsc;
    use futures::stream;
    use std::time::Duration;
    use tokio::time::timeout;
    use tokio_tungstenite::tungstenite;

    type SpeechFrame = Result<tungstenite::Message, tungstenite::Error>;

    fn provider_text(s: &str) -> Result<Message, axum::Error> {
        Ok(Message::Text(s.to_string().into()))
    }

    fn coordinator() -> (
        InterruptionCoordinator,
        mpsc::Receiver<ClientEvent>,
        mpsc::Receiver<ProviderOutbound>,
    ) {
        let (speech_tx, speech_rx) = mpsc::channel(16);
        let (provider_tx, provider_rx) = mpsc::channel(16);
        (
            InterruptionCoordinator::new(
                CallSession::shared(),
                SpeechServiceHandle::new(speech_tx),
                provider_tx,
            ),
            speech_rx,
            provider_rx,
        )
    }

    #[tokio::test]
    async fn test_stop_ends_call() {
        let (coordinator, mut speech_rx, _provider_rx) = coordinator();
        let mut provider = stream::iter(vec![
            provider_text(r#"{"event":"start","start":{"streamSid":"S1"}}"#),
            provider_text("not json"),
            provider_text(r#"{"event":"media","media":{"track":"inbound","payload":"AQ=="}}"#),
            provider_text(r#"{"event":"stop","streamSid":"S1"}"#),
            provider_text(r#"{"event":"media","media":{"track":"inbound","payload":"Ag=="}}"#),
        ]);
        let mut events = SpeechEventStream::new(stream::pending::<SpeechFrame>());

        let result = run_call(
            &coordinator,
            &mut provider,
            &mut events,
            &CancellationToken::new(),
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(speech_rx.recv().await.unwrap(), ClientEvent::audio_append("AQ=="));
        assert!(speech_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_speech_service_close_ends_call() {
        let (coordinator, _speech_rx, _provider_rx) = coordinator();
        let mut provider = stream::pending::<Result<Message, axum::Error>>();
        let mut events = SpeechEventStream::new(stream::iter(vec![Ok::<_, tungstenite::Error>(
            tungstenite::Message::Close(None),
        )]));

        let result = run_call(
            &coordinator,
            &mut provider,
            &mut events,
            &CancellationToken::new(),
        )
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_speech_transport_error_is_fatal() {
        let (coordinator, _speech_rx, _provider_rx) = coordinator();
        let mut provider = stream::pending::<Result<Message, axum::Error>>();
        let mut events = SpeechEventStream::new(stream::iter(vec![Err::<
            tungstenite::Message,
            _,
        >(
            tungstenite::Error::ConnectionClosed,
        )]));

        let result = run_call(
            &coordinator,
            &mut provider,
            &mut events,
            &CancellationToken::new(),
        )
        .await;
        assert!(matches!(result, Err(RelayError::SpeechService(_))));
    }

    #[tokio::test]
    async fn test_stalled_provider_write_does_not_block_caller_audio() {
        let (speech_tx, mut speech_rx) = mpsc::channel(16);
        // Never drained: the third provider-bound frame blocks
        let (provider_tx, _provider_rx) = mpsc::channel(2);
        let coordinator = InterruptionCoordinator::new(
            CallSession::shared(),
            SpeechServiceHandle::new(speech_tx),
            provider_tx,
        );
        let session = coordinator.session().clone();

        let (provider_in, mut provider) = futures_mpsc::unbounded::<Result<Message, axum::Error>>();
        let (speech_in, speech_frames) = futures_mpsc::unbounded::<SpeechFrame>();
        let cancel = CancellationToken::new();

        let call = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                let mut events = SpeechEventStream::new(speech_frames);
                run_call(&coordinator, &mut provider, &mut events, &cancel).await
            }
        });

        provider_in
            .unbounded_send(provider_text(r#"{"event":"start","start":{"streamSid":"S1"}}"#))
            .unwrap();
        timeout(Duration::from_secs(1), async {
            while session.lock().stream_id().is_none() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        for _ in 0..2 {
            speech_in
                .unbounded_send(Ok(tungstenite::Message::Text(
                    r#"{"type":"response.audio.delta","item_id":"R1","delta":"Zg=="}"#
                        .to_string()
                        .into(),
                )))
                .unwrap();
        }
        // Second delta is recorded, its media frame is stuck on the full queue
        timeout(Duration::from_secs(1), async {
            while session.lock().pending_marks().len() < 2 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        provider_in
            .unbounded_send(provider_text(
                r#"{"event":"media","media":{"track":"inbound","payload":"AQ=="}}"#,
            ))
            .unwrap();
        let forwarded = timeout(Duration::from_millis(500), speech_rx.recv())
            .await
            .unwrap();
        assert_eq!(forwarded, Some(ClientEvent::audio_append("AQ==")));

        // Marks are still acknowledged while the speech side is stuck
        provider_in
            .unbounded_send(provider_text(
                r#"{"event":"mark","streamSid":"S1","mark":{"name":"mark-1"}}"#,
            ))
            .unwrap();
        timeout(Duration::from_secs(1), async {
            while session.lock().pending_marks().len() != 1 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        cancel.cancel();
        let result = timeout(Duration::from_secs(1), call).await.unwrap().unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_provider_stop_cancels_speech_loop() {
        let (coordinator, _speech_rx, _provider_rx) = coordinator();
        let mut provider = stream::iter(vec![provider_text(r#"{"event":"stop","streamSid":"S1"}"#)]);
        let mut events = SpeechEventStream::new(stream::pending::<SpeechFrame>());
        let cancel = CancellationToken::new();

        let result = timeout(
            Duration::from_secs(1),
            run_call(&coordinator, &mut provider, &mut events, &cancel),
        )
        .await
        .unwrap();
        assert!(result.is_ok());
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_speech_close_cancels_provider_loop() {
        let (coordinator, _speech_rx, _provider_rx) = coordinator();
        let mut provider = stream::pending::<Result<Message, axum::Error>>();
        let mut events = SpeechEventStream::new(stream::iter(vec![Ok::<_, tungstenite::Error>(
            tungstenite::Message::Close(None),
        )]));
        let cancel = CancellationToken::new();

        let result = timeout(
            Duration::from_secs(1),
            run_call(&coordinator, &mut provider, &mut events, &cancel),
        )
        .await
        .unwrap();
        assert!(result.is_ok());
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancellation_ends_call() {
        let (coordinator, _speech_rx, _provider_rx) = coordinator();
        let mut provider = stream::pending::<Result<Message, axum::Error>>();
        let mut events = SpeechEventStream::new(stream::pending::<SpeechFrame>());
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert!(
            run_call(&coordinator, &mut provider, &mut events, &cancel)
                .await
                .is_ok()
        );
    }
}
