/*
[INPUT]:  Scripted venue behavior for a test case
[OUTPUT]: In-process websocket venue recording client frames
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new venue behaviors or fixtures
*/

//! Common test utilities for xena-ws-adapter tests

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{WebSocketStream, accept_async};
use xena_ws_adapter::{ConnectionConfig, LogonBuilder, MockLogonSigner};

pub const LOGON_ACK: &str = r#"{"35":"A","108":15,"1":[7]}"#;
pub const HEARTBEAT: &str = r#"{"35":"0"}"#;
const FRAME_TIMEOUT: Duration = Duration::from_secs(5);

pub enum VenueCommand {
    Send(String),
    /// Drop the socket without a close handshake
    Drop,
}

/// Mock venue accepting any number of sequential connections
pub struct MockVenue {
    url: String,
    frames: Mutex<mpsc::UnboundedReceiver<String>>,
    commands: mpsc::UnboundedSender<VenueCommand>,
    connections: Arc<AtomicUsize>,
}

impl MockVenue {
    /// Venue that speaks first, like the market-data endpoint
    pub async fn market_data() -> Self {
        Self::start(false, LOGON_ACK).await
    }

    /// Venue that waits for the client logon before replying
    pub async fn trading() -> Self {
        Self::start(true, LOGON_ACK).await
    }

    pub async fn start(expect_login: bool, login_reply: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock venue");
        let url = format!("ws://{}", listener.local_addr().expect("local addr"));

        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let commands_rx = Arc::new(Mutex::new(commands_rx));
        let connections = Arc::new(AtomicUsize::new(0));

        let counter = connections.clone();
        let login_reply = login_reply.to_string();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let Ok(ws) = accept_async(stream).await else {
                    continue;
                };
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(serve(
                    ws,
                    expect_login,
                    login_reply.clone(),
                    frames_tx.clone(),
                    commands_rx.clone(),
                ));
            }
        });

        Self {
            url,
            frames: Mutex::new(frames_rx),
            commands: commands_tx,
            connections,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn config(&self) -> ConnectionConfig {
        ConnectionConfig::new(self.url.clone())
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Queue a frame for the current (or next) connection
    pub fn send(&self, text: &str) {
        let _ = self.commands.send(VenueCommand::Send(text.to_string()));
    }

    pub fn drop_connection(&self) {
        let _ = self.commands.send(VenueCommand::Drop);
    }

    /// Next frame written by the client, heartbeats included
    pub async fn next_raw_frame(&self) -> String {
        let mut frames = self.frames.lock().await;
        tokio::time::timeout(FRAME_TIMEOUT, frames.recv())
            .await
            .expect("timed out waiting for client frame")
            .expect("venue stopped")
    }

    /// Next frame written by the client, skipping heartbeats
    pub async fn next_frame(&self) -> String {
        loop {
            let frame = self.next_raw_frame().await;
            if frame != HEARTBEAT {
                return frame;
            }
        }
    }

    /// Non-heartbeat frame arriving within `window`, if any
    pub async fn frame_within(&self, window: Duration) -> Option<String> {
        tokio::time::timeout(window, self.next_frame()).await.ok()
    }
}

async fn serve(
    mut ws: WebSocketStream<TcpStream>,
    expect_login: bool,
    login_reply: String,
    frames: mpsc::UnboundedSender<String>,
    commands: Arc<Mutex<mpsc::UnboundedReceiver<VenueCommand>>>,
) {
    if expect_login {
        match ws.next().await {
            Some(Ok(WsMessage::Text(text))) => {
                let _ = frames.send(text.as_str().to_string());
            }
            _ => return,
        }
    }
    if ws.send(WsMessage::Text(login_reply.into())).await.is_err() {
        return;
    }

    let mut commands = commands.lock().await;
    loop {
        tokio::select! {
            frame = ws.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => {
                    let _ = frames.send(text.as_str().to_string());
                }
                Some(Ok(WsMessage::Close(_))) | Some(Err(_)) | None => return,
                Some(Ok(_)) => {}
            },
            command = commands.recv() => match command {
                Some(VenueCommand::Send(text)) => {
                    if ws.send(WsMessage::Text(text.into())).await.is_err() {
                        return;
                    }
                }
                Some(VenueCommand::Drop) | None => return,
            },
        }
    }
}

pub fn logon_builder() -> LogonBuilder {
    LogonBuilder::new("test-key", vec![7], Arc::new(MockLogonSigner::new("test-signature")))
}

/// Poll `condition` until it holds or the frame timeout elapses
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + FRAME_TIMEOUT;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}
