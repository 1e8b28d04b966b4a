/*
[INPUT]:  Market-data endpoint config, stream ids and consumer callbacks
[OUTPUT]: Snapshot/incremental refreshes routed to the subscribed consumer
[POS]:    WebSocket layer - stream-keyed market-data subscriptions
[UPDATE]: When adding stream kinds or changing subscription parameters
*/

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info};

use super::connection::{Connection, ConnectionState, FrameHandler};
use super::listener::{ConnectionLostHandler, Listener, deliver};
use super::log::{log_decode_fail, log_message_sample_once};
use super::flatten;
use crate::codec::{self, KeyMode};
use crate::config::ConnectionConfig;
use crate::error::{Result, XenaError};
use crate::registry::Message;
use crate::types::{
    Logon, MarketDataRequest, MsgType, SubscriptionRequestType, ThrottleTimeUnit, ThrottleType,
};

const ROUTE: &str = "market-data";
pub const MARKET_WATCH_STREAM: &str = "market-watch";

/// Throttling and book shape requested for one stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeOptions {
    pub throttle_interval: i64,
    pub throttle_unit: ThrottleTimeUnit,
    pub aggregation: Option<i64>,
    pub depth: Option<i64>,
}

impl Default for SubscribeOptions {
    fn default() -> Self {
        Self {
            throttle_interval: 500,
            throttle_unit: ThrottleTimeUnit::Milliseconds,
            aggregation: None,
            depth: None,
        }
    }
}

impl SubscribeOptions {
    /// Candle streams default to a 250ms throttle
    pub fn candles() -> Self {
        Self::default().throttle(250, ThrottleTimeUnit::Milliseconds)
    }

    pub fn throttle(mut self, interval: i64, unit: ThrottleTimeUnit) -> Self {
        self.throttle_interval = interval;
        self.throttle_unit = unit;
        self
    }

    pub fn aggregation(mut self, aggregation: i64) -> Self {
        self.aggregation = Some(aggregation);
        self
    }

    pub fn depth(mut self, depth: i64) -> Self {
        self.depth = Some(depth);
        self
    }
}

pub fn candles_stream_id(symbol: &str, timeframe: &str) -> String {
    format!("candles:{symbol}:{timeframe}")
}

pub fn dom_stream_id(symbol: &str) -> String {
    format!("DOM:{symbol}:aggregated")
}

pub fn trades_stream_id(symbol: &str) -> String {
    format!("trades:{symbol}")
}

#[derive(Default)]
struct MarketDataState {
    streams: RwLock<HashMap<String, Arc<dyn Listener>>>,
}

impl MarketDataState {
    async fn dispatch(&self, message: Message) {
        let msg_type = message.msg_type();
        if !matches!(
            msg_type,
            MsgType::MarketDataSnapshotFullRefresh
                | MsgType::MarketDataIncrementalRefresh
                | MsgType::MarketDataRequestReject
        ) {
            debug!(msg_type = %msg_type, "md message ignored");
            return;
        }

        let Some(stream_id) = message.md_stream_id().map(str::to_string) else {
            return;
        };
        let listener = self.streams.read().get(&stream_id).cloned();
        match listener {
            Some(listener) => deliver(&listener, message, ROUTE).await,
            None => debug!(stream_id = %stream_id, msg_type = %msg_type, "md message for unknown stream dropped"),
        }
    }
}

#[async_trait]
impl FrameHandler for MarketDataState {
    async fn handle_frame(&self, text: &str) {
        let decoded = match codec::decode(text) {
            Ok(decoded) => decoded,
            Err(err) => {
                log_decode_fail(ROUTE, &err, text);
                return;
            }
        };
        for message in flatten(decoded) {
            log_message_sample_once(ROUTE, &message);
            self.dispatch(message).await;
        }
    }
}

/// Market-data session: one consumer per stream id
#[derive(Clone)]
pub struct MarketDataSession {
    connection: Connection,
    state: Arc<MarketDataState>,
}

impl std::fmt::Debug for MarketDataSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketDataSession")
            .field("connection", &self.connection)
            .field("streams", &self.state.streams.read().len())
            .finish()
    }
}

impl MarketDataSession {
    pub fn new(config: ConnectionConfig) -> Self {
        let state = Arc::new(MarketDataState::default());
        let connection = Connection::new(config, None, state.clone());

        // server-side subscriptions do not survive a reconnect
        let cleared = state.clone();
        connection.on_connection_lost(move |_err: Arc<XenaError>| {
            let cleared = cleared.clone();
            async move {
                let dropped = std::mem::take(&mut *cleared.streams.write()).len();
                debug!(dropped, "md subscriptions cleared after connection loss");
                Ok::<(), XenaError>(())
            }
        });

        Self { connection, state }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub async fn connect(&self) -> Result<Logon> {
        self.connection.connect().await
    }

    pub async fn close(&self) {
        self.connection.close().await
    }

    /// Runs after the subscription table has been cleared
    pub fn on_connection_lost<H>(&self, handler: H)
    where
        H: ConnectionLostHandler + 'static,
    {
        self.connection.on_connection_lost(handler);
    }

    pub fn is_subscribed(&self, stream_id: &str) -> bool {
        self.state.streams.read().contains_key(stream_id)
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.state.streams.read().keys().cloned().collect()
    }

    /// Subscribe `listener` to `stream_id`; registered once the request is sent
    pub async fn subscribe<L>(
        &self,
        stream_id: impl Into<String>,
        listener: L,
        options: SubscribeOptions,
    ) -> Result<()>
    where
        L: Listener + 'static,
    {
        let stream_id = stream_id.into();
        if self.is_subscribed(&stream_id) {
            return Err(XenaError::DuplicateSubscription(stream_id));
        }

        let request = MarketDataRequest {
            msg_type: MsgType::MarketDataRequest,
            md_stream_id: stream_id.clone(),
            subscription_request_type: Some(SubscriptionRequestType::SnapshotAndUpdates),
            throttle_type: Some(ThrottleType::OutstandingRequests),
            throttle_time_interval: options.throttle_interval,
            throttle_time_unit: Some(options.throttle_unit),
            aggregated_book: options.aggregation.unwrap_or_default(),
            market_depth: options.depth.unwrap_or_default(),
        };
        self.connection
            .send(codec::encode(&request, KeyMode::Compact)?)
            .await?;

        match self.state.streams.write().entry(stream_id.clone()) {
            Entry::Occupied(_) => return Err(XenaError::DuplicateSubscription(stream_id)),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(listener));
            }
        }

        info!(
            stream_id = %stream_id,
            throttle_interval = options.throttle_interval,
            "md subscription sent"
        );
        Ok(())
    }

    pub async fn unsubscribe(&self, stream_id: &str) -> Result<()> {
        if !self.is_subscribed(stream_id) {
            return Err(XenaError::NoSuchSubscription(stream_id.to_string()));
        }

        let request = MarketDataRequest {
            msg_type: MsgType::MarketDataRequest,
            md_stream_id: stream_id.to_string(),
            subscription_request_type: Some(SubscriptionRequestType::DisablePreviousSnapshot),
            ..Default::default()
        };
        self.connection
            .send(codec::encode(&request, KeyMode::Compact)?)
            .await?;

        self.state.streams.write().remove(stream_id);
        info!(stream_id, "md unsubscription sent");
        Ok(())
    }

    /// Candles for `symbol` at `timeframe` (`1m`, `5m`, `15m`, `30m`, `1h`, `3h`, `6h`, `12h`, `24h`)
    pub async fn candles<L>(
        &self,
        symbol: &str,
        timeframe: &str,
        listener: L,
        options: SubscribeOptions,
    ) -> Result<String>
    where
        L: Listener + 'static,
    {
        require_symbol(symbol)?;
        if timeframe.is_empty() {
            return Err(XenaError::InvalidArgument(
                "Timeframe can not be empty".to_string(),
            ));
        }
        let stream_id = candles_stream_id(symbol, timeframe);
        self.subscribe(stream_id.clone(), listener, options).await?;
        Ok(stream_id)
    }

    /// Aggregated order book for `symbol`
    pub async fn dom<L>(&self, symbol: &str, listener: L, options: SubscribeOptions) -> Result<String>
    where
        L: Listener + 'static,
    {
        require_symbol(symbol)?;
        let stream_id = dom_stream_id(symbol);
        self.subscribe(stream_id.clone(), listener, options).await?;
        Ok(stream_id)
    }

    pub async fn trades<L>(
        &self,
        symbol: &str,
        listener: L,
        options: SubscribeOptions,
    ) -> Result<String>
    where
        L: Listener + 'static,
    {
        require_symbol(symbol)?;
        let stream_id = trades_stream_id(symbol);
        self.subscribe(stream_id.clone(), listener, options).await?;
        Ok(stream_id)
    }

    /// Snapshot of every instrument; each update is a full refresh
    pub async fn market_watch<L>(&self, listener: L, options: SubscribeOptions) -> Result<String>
    where
        L: Listener + 'static,
    {
        self.subscribe(MARKET_WATCH_STREAM, listener, options).await?;
        Ok(MARKET_WATCH_STREAM.to_string())
    }
}

fn require_symbol(symbol: &str) -> Result<()> {
    if symbol.is_empty() {
        return Err(XenaError::InvalidArgument(
            "Symbol can not be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MarketDataRefresh;
    use rstest::rstest;
    use tokio::sync::mpsc;

    #[rstest]
    #[case(candles_stream_id("BTC/USDT", "1m"), "candles:BTC/USDT:1m")]
    #[case(dom_stream_id("XBTUSD"), "DOM:XBTUSD:aggregated")]
    #[case(trades_stream_id("XBTUSD"), "trades:XBTUSD")]
    fn test_stream_ids(#[case] stream_id: String, #[case] expected: &str) {
        assert_eq!(stream_id, expected);
    }

    #[test]
    fn test_options_defaults() {
        let options = SubscribeOptions::default();
        assert_eq!(options.throttle_interval, 500);
        assert_eq!(options.throttle_unit, ThrottleTimeUnit::Milliseconds);
        assert_eq!(SubscribeOptions::candles().throttle_interval, 250);
        assert_eq!(SubscribeOptions::default().depth(10).depth, Some(10));
    }

    #[tokio::test]
    async fn test_empty_symbol_rejected_before_send() {
        let session = MarketDataSession::new(ConnectionConfig::new("ws://127.0.0.1:1"));
        let result = session
            .trades("", |_message: Message| async move {}, SubscribeOptions::default())
            .await;
        assert!(matches!(result, Err(XenaError::InvalidArgument(_))));
        assert_eq!(session.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_unsubscribe_unknown_stream() {
        let session = MarketDataSession::new(ConnectionConfig::new("ws://127.0.0.1:1"));
        let result = session.unsubscribe("trades:XBTUSD").await;
        assert!(matches!(result, Err(XenaError::NoSuchSubscription(id)) if id == "trades:XBTUSD"));
    }

    #[tokio::test]
    async fn test_dispatch_routes_by_stream_id() {
        let state = MarketDataState::default();
        let (tx, mut rx) = mpsc::unbounded_channel();
        state.streams.write().insert(
            "trades:XBTUSD".to_string(),
            Arc::new(move |message: Message| {
                let tx = tx.clone();
                async move {
                    let _ = tx.send(message);
                }
            }),
        );

        state
            .handle_frame(r#"{"35":"X","1500":"trades:XBTUSD","55":"XBTUSD"}"#)
            .await;
        state
            .handle_frame(r#"{"35":"X","1500":"trades:ETHUSD"}"#)
            .await;
        state.handle_frame(r#"{"35":"8","1500":"trades:XBTUSD"}"#).await;
        state.handle_frame("not json").await;

        match rx.try_recv().unwrap() {
            Message::MarketDataRefresh(MarketDataRefresh { symbol, .. }) => {
                assert_eq!(symbol, "XBTUSD")
            }
            other => panic!("unexpected message {other:?}"),
        }
        assert!(rx.try_recv().is_err());
    }
}
