//! WebSocket Mock Server for the speech service
//!
//! Accepts connections the way the Realtime API does, records every client
//! event it receives and replays a scripted list of server events once the
//! first caller audio arrives. A script entry built by [`close_directive`]
//! makes the mock close the connection at that point.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

/// Upgrade request details seen by the mock
#[derive(Debug, Clone, Default)]
pub struct Handshake {
    pub uri: String,
    pub authorization: Option<String>,
    pub beta: Option<String>,
}

/// Script entry that closes the connection instead of sending an event
pub fn close_directive() -> Value {
    json!({"mock": "close"})
}

/// Handle to a running mock
pub struct RealtimeMock {
    pub addr: SocketAddr,
    /// Every client event received, in order
    pub received: mpsc::UnboundedReceiver<Value>,
    pub handshake: Arc<Mutex<Option<Handshake>>>,
    /// One entry per Close frame received from the gateway
    pub closes: mpsc::UnboundedReceiver<()>,
}

impl RealtimeMock {
    /// Endpoint URL to put in the gateway configuration
    pub fn url(&self) -> String {
        format!("ws://{}/v1/realtime", self.addr)
    }

    /// Wait until the gateway sends a Close frame
    pub async fn wait_for_close(&mut self) {
        self.closes
            .recv()
            .await
            .expect("mock stopped before a close frame arrived");
    }

    /// Wait for the next client event of type `kind`, skipping others
    pub async fn next_of_type(&mut self, kind: &str) -> Value {
        loop {
            let event = self
                .received
                .recv()
                .await
                .expect("mock closed before event arrived");
            if event["type"] == kind {
                return event;
            }
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    script: Arc<Vec<Value>>,
    events_tx: mpsc::UnboundedSender<Value>,
    closes_tx: mpsc::UnboundedSender<()>,
    handshake: Arc<Mutex<Option<Handshake>>>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let record = handshake.clone();
    let ws_stream = accept_hdr_async(stream, move |req: &Request, resp: Response| {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        *record.lock() = Some(Handshake {
            uri: req.uri().to_string(),
            authorization: header("authorization"),
            beta: header("openai-beta"),
        });
        Ok::<Response, ErrorResponse>(resp)
    })
    .await?;
    let (mut write, mut read) = ws_stream.split();

    let created = json!({
        "type": "session.created",
        "event_id": "evt_1",
        "session": {"id": "sess_mock", "model": "gpt-4o-realtime-preview"}
    });
    write.send(Message::Text(created.to_string().into())).await?;

    let mut replied = false;
    while let Some(msg) = read.next().await {
        match msg? {
            Message::Text(text) => {
                let event: Value = serde_json::from_str(text.as_str())?;
                let is_audio = event["type"] == "input_audio_buffer.append";
                let _ = events_tx.send(event);

                if is_audio && !replied {
                    replied = true;
                    for reply in script.iter() {
                        if *reply == close_directive() {
                            write.send(Message::Close(None)).await?;
                            return Ok(());
                        }
                        write.send(Message::Text(reply.to_string().into())).await?;
                    }
                }
            }
            Message::Close(_) => {
                let _ = closes_tx.send(());
                break;
            }
            _ => {}
        }
    }
    Ok(())
}

/// Spawn a mock that replies with `script` after the first audio append
pub async fn spawn_realtime_mock(script: Vec<Value>) -> RealtimeMock {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (events_tx, received) = mpsc::unbounded_channel();
    let (closes_tx, closes) = mpsc::unbounded_channel();
    let handshake = Arc::new(Mutex::new(None));
    let script = Arc::new(script);

    let shared = handshake.clone();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let script = script.clone();
            let events_tx = events_tx.clone();
            let closes_tx = closes_tx.clone();
            let handshake = shared.clone();
            tokio::spawn(async move {
                if let Err(e) =
                    handle_connection(stream, script, events_tx, closes_tx, handshake).await
                {
                    eprintln!("Realtime mock connection error: {}", e);
                }
            });
        }
    });

    RealtimeMock {
        addr,
        received,
        handshake,
        closes,
    }
}
