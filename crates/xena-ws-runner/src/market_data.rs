/*
[INPUT]:  Market-data config, reconnect policy, shutdown token
[OUTPUT]: Logged stream refreshes with reconnect and re-subscribe on loss
[POS]:    Runner layer - market-data subcommand
[UPDATE]: When changing subscription handling, reconnection, or shutdown semantics.
*/

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use anyhow::{Context, bail};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use xena_ws_adapter::{Listener, MarketDataSession, Message, XenaError};

use crate::config::{MarketDataConfig, ReconnectConfig, SubscriptionConfig};
use crate::reconnect::retry_with_backoff;

/// Counters shared with the stream listeners and the loss handler
#[derive(Debug, Default)]
pub struct RunnerStats {
    pub messages: AtomicU64,
    pub reconnects: AtomicU64,
    pub gave_up: AtomicBool,
}

pub struct MarketDataRunner {
    session: MarketDataSession,
    subscriptions: Arc<Vec<SubscriptionConfig>>,
    shutdown: CancellationToken,
    stats: Arc<RunnerStats>,
}

impl MarketDataRunner {
    pub fn new(
        config: &MarketDataConfig,
        reconnect: ReconnectConfig,
        shutdown: CancellationToken,
    ) -> Self {
        let runner = Self {
            session: MarketDataSession::new(config.connection()),
            subscriptions: Arc::new(config.subscriptions.clone()),
            shutdown,
            stats: Arc::new(RunnerStats::default()),
        };
        runner.install_reconnect(reconnect);
        runner
    }

    pub fn session(&self) -> &MarketDataSession {
        &self.session
    }

    pub fn stats(&self) -> &RunnerStats {
        &self.stats
    }

    fn install_reconnect(&self, policy: ReconnectConfig) {
        let session = self.session.clone();
        let subscriptions = self.subscriptions.clone();
        let shutdown = self.shutdown.clone();
        let stats = self.stats.clone();

        // the session has already cleared its stream table when this runs
        self.session.on_connection_lost(move |err: Arc<XenaError>| {
            let session = session.clone();
            let subscriptions = subscriptions.clone();
            let shutdown = shutdown.clone();
            let stats = stats.clone();
            async move { recover(session, subscriptions, policy, shutdown, stats, err).await }
        });
    }

    /// Connect, subscribe every configured stream, then wait for shutdown
    pub async fn run(&self) -> anyhow::Result<()> {
        let ack = self
            .session
            .connect()
            .await
            .context("connect market data")?;
        info!(
            url = %self.session.connection().url(),
            heartbeat_secs = ack.heart_bt_int,
            "market data connected"
        );

        let stream_ids = subscribe_all(&self.session, &self.subscriptions, &self.stats)
            .await
            .context("subscribe market data streams")?;
        info!(streams = ?stream_ids, "market data subscribed");

        self.shutdown.cancelled().await;
        self.session.close().await;
        info!(
            messages = self.stats.messages.load(Ordering::Relaxed),
            reconnects = self.stats.reconnects.load(Ordering::Relaxed),
            "market data runner stopped"
        );

        if self.stats.gave_up.load(Ordering::SeqCst) {
            bail!("market data reconnect gave up");
        }
        Ok(())
    }
}

async fn recover(
    session: MarketDataSession,
    subscriptions: Arc<Vec<SubscriptionConfig>>,
    policy: ReconnectConfig,
    shutdown: CancellationToken,
    stats: Arc<RunnerStats>,
    err: Arc<XenaError>,
) -> xena_ws_adapter::Result<()> {
    if shutdown.is_cancelled() {
        return Ok(());
    }
    warn!(error = %err, "market data connection lost; reconnecting");

    if retry_with_backoff("market-data", &policy, &shutdown, || session.connect())
        .await
        .is_none()
    {
        stats.gave_up.store(true, Ordering::SeqCst);
        shutdown.cancel();
        return Ok(());
    }
    stats.reconnects.fetch_add(1, Ordering::Relaxed);

    let stream_ids = subscribe_all(&session, &subscriptions, &stats).await?;
    info!(streams = stream_ids.len(), "market data re-subscribed");
    Ok(())
}

/// Subscribe each configured stream; returns the stream ids in config order
pub async fn subscribe_all(
    session: &MarketDataSession,
    subscriptions: &[SubscriptionConfig],
    stats: &Arc<RunnerStats>,
) -> xena_ws_adapter::Result<Vec<String>> {
    let mut stream_ids = Vec::with_capacity(subscriptions.len());
    for subscription in subscriptions {
        let listener = stream_listener(stats.clone());
        let options = subscription.options();
        let stream_id = match subscription {
            SubscriptionConfig::Candles {
                symbol, timeframe, ..
            } => session.candles(symbol, timeframe, listener, options).await?,
            SubscriptionConfig::Dom { symbol, .. } => session.dom(symbol, listener, options).await?,
            SubscriptionConfig::Trades { symbol, .. } => {
                session.trades(symbol, listener, options).await?
            }
            SubscriptionConfig::MarketWatch => session.market_watch(listener, options).await?,
        };
        stream_ids.push(stream_id);
    }
    Ok(stream_ids)
}

fn stream_listener(stats: Arc<RunnerStats>) -> impl Listener + 'static {
    move |message: Message| {
        let stats = stats.clone();
        async move {
            stats.messages.fetch_add(1, Ordering::Relaxed);
            log_market_data(&message);
        }
    }
}

fn log_market_data(message: &Message) {
    match message {
        Message::MarketDataRefresh(refresh) => info!(
            stream_id = %refresh.md_stream_id,
            msg_type = %refresh.msg_type,
            symbol = %refresh.symbol,
            entries = refresh.md_entry.len(),
            last_update = %format_nanos(refresh.last_update_time),
            "market data"
        ),
        Message::MarketDataRequestReject(reject) => warn!(
            stream_id = %reject.md_stream_id,
            reason = %reject.md_req_rej_reason,
            text = %reject.text,
            "market data request rejected"
        ),
        other => debug!(msg_type = %other.msg_type(), "market data message"),
    }
}

/// RFC 3339 rendering of a nanosecond timestamp, `-` when unset
pub(crate) fn format_nanos(nanos: i64) -> String {
    if nanos <= 0 {
        return "-".to_string();
    }
    chrono::DateTime::from_timestamp_nanos(nanos).to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_nanos() {
        assert_eq!(format_nanos(0), "-");
        assert_eq!(
            format_nanos(1_700_000_000_000_000_000),
            "2023-11-14T22:13:20+00:00"
        );
    }

    #[tokio::test]
    async fn test_stream_listener_counts_messages() {
        let stats = Arc::new(RunnerStats::default());
        let listener = stream_listener(stats.clone());
        listener
            .on_message(Message::MarketDataRefresh(Default::default()))
            .await;
        listener
            .on_message(Message::Heartbeat(Default::default()))
            .await;
        assert_eq!(stats.messages.load(Ordering::Relaxed), 2);
    }
}
