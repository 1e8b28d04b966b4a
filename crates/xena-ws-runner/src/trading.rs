/*
[INPUT]:  Trading config with credentials, reconnect policy, shutdown token
[OUTPUT]: Logged account state and execution reports, re-requested after reconnect
[POS]:    Runner layer - trading subcommand
[UPDATE]: When changing state requests, reconnection, or report logging
*/

use std::sync::Arc;
use std::sync::atomic::Ordering;

use anyhow::{Context, bail};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;
use xena_ws_adapter::{Listener, Message, TradingSession, XenaError};

use crate::config::{ReconnectConfig, TradingConfig};
use crate::market_data::{RunnerStats, format_nanos};
use crate::reconnect::retry_with_backoff;

pub struct TradingRunner {
    session: TradingSession,
    accounts: Arc<Vec<u64>>,
    shutdown: CancellationToken,
    stats: Arc<RunnerStats>,
}

impl TradingRunner {
    pub fn new(
        config: &TradingConfig,
        reconnect: ReconnectConfig,
        shutdown: CancellationToken,
    ) -> anyhow::Result<Self> {
        let session = TradingSession::with_credentials(config.connection(), &config.credentials())
            .context("build trading logon")?;
        let runner = Self {
            session,
            accounts: Arc::new(config.accounts.clone()),
            shutdown,
            stats: Arc::new(RunnerStats::default()),
        };
        runner
            .session
            .listen(report_listener(runner.stats.clone()))
            .context("register report listener")?;
        runner.install_reconnect(reconnect);
        Ok(runner)
    }

    pub fn session(&self) -> &TradingSession {
        &self.session
    }

    pub fn stats(&self) -> &RunnerStats {
        &self.stats
    }

    fn install_reconnect(&self, policy: ReconnectConfig) {
        let session = self.session.clone();
        let accounts = self.accounts.clone();
        let shutdown = self.shutdown.clone();
        let stats = self.stats.clone();

        self.session.on_connection_lost(move |err: Arc<XenaError>| {
            let session = session.clone();
            let accounts = accounts.clone();
            let shutdown = shutdown.clone();
            let stats = stats.clone();
            async move { recover(session, accounts, policy, shutdown, stats, err).await }
        });
    }

    /// Log in, request account state, then wait for shutdown
    pub async fn run(&self) -> anyhow::Result<()> {
        let ack = self.session.connect().await.context("trading logon")?;
        info!(
            url = %self.session.connection().url(),
            accounts = ?ack.account,
            heartbeat_secs = ack.heart_bt_int,
            "trading session logged in"
        );

        request_state(&self.session, &self.accounts)
            .await
            .context("request account state")?;

        self.shutdown.cancelled().await;
        self.session.close().await;
        info!(
            messages = self.stats.messages.load(Ordering::Relaxed),
            reconnects = self.stats.reconnects.load(Ordering::Relaxed),
            "trading runner stopped"
        );

        if self.stats.gave_up.load(Ordering::SeqCst) {
            bail!("trading reconnect gave up");
        }
        Ok(())
    }
}

async fn recover(
    session: TradingSession,
    accounts: Arc<Vec<u64>>,
    policy: ReconnectConfig,
    shutdown: CancellationToken,
    stats: Arc<RunnerStats>,
    err: Arc<XenaError>,
) -> xena_ws_adapter::Result<()> {
    if shutdown.is_cancelled() {
        return Ok(());
    }
    warn!(error = %err, "trading connection lost; reconnecting");

    if retry_with_backoff("trading", &policy, &shutdown, || session.connect())
        .await
        .is_none()
    {
        stats.gave_up.store(true, Ordering::SeqCst);
        shutdown.cancel();
        return Ok(());
    }
    stats.reconnects.fetch_add(1, Ordering::Relaxed);

    // listeners survive the loss; venue-side state has to be fetched again
    request_state(&session, &accounts).await
}

/// Balances, positions and open orders for every account
pub async fn request_state(session: &TradingSession, accounts: &[u64]) -> xena_ws_adapter::Result<()> {
    for &account in accounts {
        let request_id = Uuid::new_v4().to_string();
        session.account_status_report(account, &request_id).await?;
        session.positions(account).await?;
        session.orders(account).await?;
        debug!(account, request_id = %request_id, "account state requested");
    }
    Ok(())
}

fn report_listener(stats: Arc<RunnerStats>) -> impl Listener + 'static {
    move |message: Message| {
        let stats = stats.clone();
        async move {
            stats.messages.fetch_add(1, Ordering::Relaxed);
            log_report(&message);
        }
    }
}

fn log_report(message: &Message) {
    match message {
        Message::ExecutionReport(report) => info!(
            account = report.account,
            cl_ord_id = %report.cl_ord_id,
            order_id = %report.order_id,
            symbol = %report.symbol,
            exec_type = ?report.exec_type,
            ord_status = ?report.ord_status,
            leaves_qty = ?report.leaves_qty,
            cum_qty = ?report.cum_qty,
            "execution report"
        ),
        Message::OrderCancelReject(reject) => warn!(
            cl_ord_id = %reject.cl_ord_id,
            reason = %reject.cxl_rej_reason,
            text = %reject.text,
            "order cancel rejected"
        ),
        Message::OrderMassStatusResponse(response) => info!(
            account = response.account,
            orders = response.orders.len(),
            "open orders"
        ),
        Message::MassPositionReport(report) => info!(
            account = report.account,
            positions = report.open_positions.len(),
            "open positions"
        ),
        Message::PositionReport(position) => info!(
            account = position.account,
            position_id = position.position_id,
            symbol = %position.symbol,
            long_qty = ?position.long_qty,
            short_qty = ?position.short_qty,
            "position"
        ),
        Message::BalanceIncrementalRefresh(balances) => info!(
            account = balances.account,
            msg_type = %balances.msg_type,
            balances = balances.balances.len(),
            last_update = %format_nanos(balances.last_update_time),
            "balances"
        ),
        Message::MarginRequirementReport(margin) => info!(
            account = margin.account,
            currency = %margin.settl_currency,
            amounts = margin.margin_amounts.len(),
            "margin requirement"
        ),
        Message::PositionMaintenanceReport(report) => info!(
            account = report.account,
            symbol = %report.symbol,
            status = %report.pos_maint_status,
            "position maintenance"
        ),
        Message::Reject(reject) => warn!(
            reason = %reject.session_reject_reason,
            text = %reject.text,
            "session reject"
        ),
        other => debug!(msg_type = %other.msg_type(), "trading message"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_report_listener_counts_messages() {
        let stats = Arc::new(RunnerStats::default());
        let listener = report_listener(stats.clone());
        listener
            .on_message(Message::ExecutionReport(Default::default()))
            .await;
        listener
            .on_message(Message::BalanceIncrementalRefresh(Default::default()))
            .await;
        assert_eq!(stats.messages.load(Ordering::Relaxed), 2);
    }
}
