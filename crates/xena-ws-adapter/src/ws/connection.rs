/*
[INPUT]:  Endpoint config, optional logon producer, session frame handler
[OUTPUT]: One authenticated websocket with keepalive, read loop and loss hooks
[POS]:    WebSocket layer - channel lifecycle shared by both sessions
[UPDATE]: When changing handshake, keepalive or close semantics
*/

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{FutureExt, SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::listener::ConnectionLostHandler;
use super::log::{RAW_LOG_MAX_BYTES, truncate_for_log};
use crate::codec::{self, Decoded, KeyMode};
use crate::config::ConnectionConfig;
use crate::error::{Result, XenaError};
use crate::registry::Message;
use crate::types::{Heartbeat, Logon};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, WsMessage>;
type WsSource = SplitStream<WsStream>;

/// Produces the encoded logon sent as the first frame of every handshake
pub type LogonProducer = Arc<dyn Fn() -> Result<String> + Send + Sync>;

/// Receives every text frame read from the channel, in order
#[async_trait]
pub trait FrameHandler: Send + Sync {
    async fn handle_frame(&self, text: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Authenticated,
    Closing,
}

struct Inner {
    config: ConnectionConfig,
    logon: Option<LogonProducer>,
    handler: Arc<dyn FrameHandler>,
    state: Mutex<ConnectionState>,
    /// Single writer; holding the lock is the in-flight write
    writer: tokio::sync::Mutex<Option<WsSink>>,
    connect_lock: tokio::sync::Mutex<()>,
    explicitly_closed: AtomicBool,
    loss_handlers: RwLock<Vec<Arc<dyn ConnectionLostHandler>>>,
    logon_ack: Mutex<Option<Logon>>,
    /// Bumped on every successful handshake
    generation: AtomicU64,
    /// Highest generation already torn down
    torn_down: AtomicU64,
    cancel: Mutex<CancellationToken>,
}

/// One physical duplex channel.
///
/// Cheap to clone; clones share the channel.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("url", &self.inner.config.url)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Connection {
    pub fn new(
        config: ConnectionConfig,
        logon: Option<LogonProducer>,
        handler: Arc<dyn FrameHandler>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                logon,
                handler,
                state: Mutex::new(ConnectionState::Disconnected),
                writer: tokio::sync::Mutex::new(None),
                connect_lock: tokio::sync::Mutex::new(()),
                explicitly_closed: AtomicBool::new(false),
                loss_handlers: RwLock::new(Vec::new()),
                logon_ack: Mutex::new(None),
                generation: AtomicU64::new(0),
                torn_down: AtomicU64::new(0),
                cancel: Mutex::new(CancellationToken::new()),
            }),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.lock()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Authenticated
    }

    pub fn url(&self) -> &str {
        &self.inner.config.url
    }

    /// Register a callback run, in registration order, after an unexpected loss
    pub fn on_connection_lost<H>(&self, handler: H)
    where
        H: ConnectionLostHandler + 'static,
    {
        self.inner.loss_handlers.write().push(Arc::new(handler));
    }

    /// Open the channel and complete the handshake.
    ///
    /// Returns the stored logon acknowledgment when already connected.
    pub async fn connect(&self) -> Result<Logon> {
        let _guard = self.inner.connect_lock.lock().await;

        if self.is_connected()
            && let Some(ack) = self.inner.logon_ack.lock().clone()
        {
            return Ok(ack);
        }

        self.inner.explicitly_closed.store(false, Ordering::SeqCst);
        self.set_state(ConnectionState::Connecting);

        match self.open().await {
            Ok(ack) => Ok(ack),
            Err(err) => {
                warn!(url = %self.inner.config.url, error = %err, "ws connect failed");
                self.set_state(ConnectionState::Disconnected);
                Err(err)
            }
        }
    }

    async fn open(&self) -> Result<Logon> {
        let endpoint = self.inner.config.endpoint()?;
        let (stream, _response) = connect_async(endpoint.as_str()).await?;
        let (mut sink, mut source) = stream.split();

        if let Some(producer) = &self.inner.logon {
            let logon = producer()?;
            sink.send(WsMessage::Text(logon.into())).await?;
        }

        let reply = read_text(&mut source).await?;
        let ack = match codec::decode(&reply) {
            Ok(Decoded::Message(Message::Logon(ack))) => ack,
            Ok(other) => {
                return Err(XenaError::LoginFailed(format!(
                    "unexpected message type \"{}\" instead of logon",
                    other.msg_type().map(|t| t.to_string()).unwrap_or_default()
                )));
            }
            Err(XenaError::UnknownMessageType(code)) => {
                return Err(XenaError::LoginFailed(format!(
                    "unexpected message type \"{code}\" instead of logon"
                )));
            }
            Err(err) => return Err(err),
        };

        if !ack.reject_text.is_empty() {
            return Err(XenaError::LoginFailed(ack.reject_text));
        }

        // close() raced the handshake
        if self.inner.explicitly_closed.load(Ordering::SeqCst) {
            let _ = sink.close().await;
            return Err(XenaError::ConnectionClosed);
        }

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        {
            let mut current = self.inner.cancel.lock();
            current.cancel();
            *current = token.clone();
        }
        *self.inner.writer.lock().await = Some(sink);
        *self.inner.logon_ack.lock() = Some(ack.clone());
        self.set_state(ConnectionState::Authenticated);

        let interval = if ack.heart_bt_int > 0 {
            Duration::from_secs(ack.heart_bt_int as u64)
        } else {
            self.inner.config.default_heartbeat_interval()
        };

        info!(
            url = %self.inner.config.url,
            generation,
            heartbeat_secs = interval.as_secs(),
            accounts = ?ack.account,
            "ws connected"
        );

        tokio::spawn(self.clone().keepalive_loop(generation, token.clone(), interval));
        tokio::spawn(self.clone().read_loop(generation, token, source));

        Ok(ack)
    }

    /// Write one encoded message, connecting first when needed.
    ///
    /// Dropped without error after an explicit `close()`.
    pub async fn send(&self, text: String) -> Result<()> {
        if self.inner.explicitly_closed.load(Ordering::SeqCst) {
            debug!(bytes = text.len(), "ws send dropped, connection closed");
            return Ok(());
        }
        if !self.is_connected() {
            self.connect().await?;
        }
        self.write(text).await
    }

    async fn write(&self, text: String) -> Result<()> {
        let mut writer = self.inner.writer.lock().await;
        let sink = writer.as_mut().ok_or(XenaError::NotConnected)?;
        sink.send(WsMessage::Text(text.into())).await?;
        Ok(())
    }

    /// Close the channel without running loss callbacks. Idempotent.
    pub async fn close(&self) {
        self.inner.explicitly_closed.store(true, Ordering::SeqCst);
        self.inner.cancel.lock().cancel();
        self.inner
            .torn_down
            .fetch_max(self.inner.generation.load(Ordering::SeqCst), Ordering::SeqCst);

        let sink = self.inner.writer.lock().await.take();
        if let Some(mut sink) = sink {
            self.set_state(ConnectionState::Closing);
            if let Err(err) = sink.send(WsMessage::Close(None)).await {
                debug!(error = %err, "ws close frame not sent");
            }
            let _ = sink.close().await;
            info!(url = %self.inner.config.url, "ws closed");
        }

        *self.inner.logon_ack.lock() = None;
        self.set_state(ConnectionState::Disconnected);
    }

    async fn keepalive_loop(self, generation: u64, token: CancellationToken, interval: Duration) {
        let heartbeat = match codec::encode(&Heartbeat::new(), KeyMode::Compact) {
            Ok(heartbeat) => heartbeat,
            Err(err) => {
                self.handle_close(generation, err).await;
                return;
            }
        };

        loop {
            let sent = tokio::select! {
                _ = token.cancelled() => return,
                sent = self.write(heartbeat.clone()) => sent,
            };
            if let Err(err) = sent {
                self.handle_close(generation, err).await;
                return;
            }

            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }

    async fn read_loop(self, generation: u64, token: CancellationToken, mut source: WsSource) {
        loop {
            let frame = tokio::select! {
                _ = token.cancelled() => return,
                frame = source.next() => frame,
            };

            let err = match frame {
                Some(Ok(WsMessage::Text(text))) => {
                    self.inner.handler.handle_frame(text.as_str()).await;
                    continue;
                }
                Some(Ok(WsMessage::Binary(bytes))) => {
                    match std::str::from_utf8(&bytes) {
                        Ok(text) => self.inner.handler.handle_frame(text).await,
                        Err(err) => debug!(error = %err, bytes = bytes.len(), "ws binary frame not utf-8"),
                    }
                    continue;
                }
                Some(Ok(WsMessage::Close(frame))) => {
                    debug!(frame = ?frame, "ws close frame received");
                    XenaError::ConnectionClosed
                }
                Some(Ok(_)) => continue,
                Some(Err(err)) => err.into(),
                None => XenaError::ConnectionClosed,
            };

            self.handle_close(generation, err).await;
            return;
        }
    }

    /// Runs inside the failing loop; never aborts the calling task
    async fn handle_close(&self, generation: u64, err: XenaError) {
        if self.inner.generation.load(Ordering::SeqCst) != generation {
            debug!(generation, error = %err, "ws stale generation closed");
            return;
        }
        if self.inner.torn_down.fetch_max(generation, Ordering::SeqCst) >= generation {
            return;
        }

        self.inner.cancel.lock().cancel();
        self.inner.writer.lock().await.take();
        *self.inner.logon_ack.lock() = None;
        self.set_state(ConnectionState::Disconnected);

        if self.inner.explicitly_closed.load(Ordering::SeqCst) {
            debug!(error = %err, "ws closed after explicit close");
            return;
        }

        warn!(url = %self.inner.config.url, error = %err, "ws connection lost");

        let err = Arc::new(err);
        let handlers: Vec<_> = self.inner.loss_handlers.read().clone();
        for (index, handler) in handlers.iter().enumerate() {
            let outcome = std::panic::AssertUnwindSafe(handler.on_connection_lost(err.clone()))
                .catch_unwind()
                .await;
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(cb_err)) => warn!(index, error = %cb_err, "connection lost callback failed"),
                Err(_) => warn!(index, "connection lost callback panicked"),
            }
        }
    }

    fn set_state(&self, state: ConnectionState) {
        *self.inner.state.lock() = state;
    }
}

/// First text frame, skipping control frames
async fn read_text(source: &mut WsSource) -> Result<String> {
    loop {
        match source.next().await {
            Some(Ok(WsMessage::Text(text))) => return Ok(text.as_str().to_string()),
            Some(Ok(WsMessage::Binary(bytes))) => {
                return String::from_utf8(bytes.to_vec())
                    .map_err(|err| XenaError::Decode(format!("logon reply not utf-8: {err}")));
            }
            Some(Ok(WsMessage::Close(frame))) => {
                let reason = frame
                    .map(|frame| truncate_for_log(frame.reason.as_str(), RAW_LOG_MAX_BYTES))
                    .unwrap_or_default();
                debug!(reason = %reason, "ws closed during handshake");
                return Err(XenaError::ConnectionClosed);
            }
            Some(Ok(_)) => continue,
            Some(Err(err)) => return Err(err.into()),
            None => return Err(XenaError::ConnectionClosed),
        }
    }
}
