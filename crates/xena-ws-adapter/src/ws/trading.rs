/*
[INPUT]:  Trading endpoint config, signed logon builder, listeners, commands
[OUTPUT]: Authenticated command channel with type-routed inbound reports
[POS]:    WebSocket layer - trading session (orders, positions, balances)
[UPDATE]: When adding commands or changing listener routing
*/

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use tracing::{debug, info};

use super::connection::{Connection, ConnectionState, FrameHandler, LogonProducer};
use super::flatten;
use super::listener::{ConnectionLostHandler, Listener, deliver};
use super::log::{log_decode_fail, log_message_sample_once};
use crate::auth::LogonBuilder;
use crate::codec::KeyMode;
use crate::commands::{self, OrderParams};
use crate::config::{ConnectionConfig, TradingCredentials};
use crate::error::{Result, XenaError};
use crate::registry::Message;
use crate::types::{Logon, MsgType, NewOrderSingle, PositionEffect, Side};

const ROUTE: &str = "trading";
const CATCH_ALL: &str = "all";

#[derive(Default)]
struct ListenerTable {
    by_type: HashMap<MsgType, Arc<dyn Listener>>,
    catch_all: Option<Arc<dyn Listener>>,
}

#[derive(Default)]
struct TradingState {
    listeners: RwLock<ListenerTable>,
}

impl TradingState {
    /// Type listener first, then the catch-all
    async fn dispatch(&self, message: Message) {
        let msg_type = message.msg_type();
        let (typed, catch_all) = {
            let table = self.listeners.read();
            (table.by_type.get(&msg_type).cloned(), table.catch_all.clone())
        };

        match (typed, catch_all) {
            (None, None) => debug!(msg_type = %msg_type, "trading message without listener"),
            (Some(typed), None) => deliver(&typed, message, ROUTE).await,
            (None, Some(catch_all)) => deliver(&catch_all, message, ROUTE).await,
            (Some(typed), Some(catch_all)) => {
                deliver(&typed, message.clone(), ROUTE).await;
                deliver(&catch_all, message, ROUTE).await;
            }
        }
    }
}

#[async_trait]
impl FrameHandler for TradingState {
    async fn handle_frame(&self, text: &str) {
        let decoded = match crate::codec::decode(text) {
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

/// Trading session.
///
/// Listeners survive connection loss; state requests must be re-sent by the
/// caller after reconnecting.
#[derive(Clone)]
pub struct TradingSession {
    connection: Connection,
    state: Arc<TradingState>,
}

impl std::fmt::Debug for TradingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = self.state.listeners.read();
        f.debug_struct("TradingSession")
            .field("connection", &self.connection)
            .field("listeners", &table.by_type.len())
            .field("catch_all", &table.catch_all.is_some())
            .finish()
    }
}

impl TradingSession {
    pub fn new(config: ConnectionConfig, logon: LogonBuilder) -> Self {
        let state = Arc::new(TradingState::default());
        let producer: LogonProducer = Arc::new(move || logon.encode());
        let connection = Connection::new(config, Some(producer), state.clone());
        Self { connection, state }
    }

    pub fn with_credentials(config: ConnectionConfig, credentials: &TradingCredentials) -> Result<Self> {
        Ok(Self::new(config, credentials.logon_builder()?))
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Log in with a freshly signed logon
    pub async fn connect(&self) -> Result<Logon> {
        self.connection.connect().await
    }

    pub async fn close(&self) {
        self.connection.close().await
    }

    pub fn on_connection_lost<H>(&self, handler: H)
    where
        H: ConnectionLostHandler + 'static,
    {
        self.connection.on_connection_lost(handler);
    }

    /// Register the listener invoked for every inbound message
    pub fn listen<L>(&self, listener: L) -> Result<()>
    where
        L: Listener + 'static,
    {
        let mut table = self.state.listeners.write();
        if table.catch_all.is_some() {
            return Err(XenaError::DuplicateListener(CATCH_ALL.to_string()));
        }
        table.catch_all = Some(Arc::new(listener));
        Ok(())
    }

    pub fn listen_type<L>(&self, msg_type: MsgType, listener: L) -> Result<()>
    where
        L: Listener + 'static,
    {
        self.register(msg_type, Arc::new(listener))
    }

    /// One listener for several types. A duplicate fails the call but keeps
    /// the types registered before it.
    pub fn listen_types<L>(&self, msg_types: &[MsgType], listener: L) -> Result<()>
    where
        L: Listener + 'static,
    {
        let listener: Arc<dyn Listener> = Arc::new(listener);
        for msg_type in msg_types {
            self.register(*msg_type, listener.clone())?;
        }
        Ok(())
    }

    fn register(&self, msg_type: MsgType, listener: Arc<dyn Listener>) -> Result<()> {
        match self.state.listeners.write().by_type.entry(msg_type) {
            Entry::Occupied(_) => Err(XenaError::DuplicateListener(msg_type.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(listener);
                Ok(())
            }
        }
    }

    /// No-op when nothing is registered for `msg_type`
    pub fn remove_listener(&self, msg_type: MsgType) {
        self.state.listeners.write().by_type.remove(&msg_type);
    }

    pub fn remove_catch_all(&self) {
        self.state.listeners.write().catch_all = None;
    }

    pub fn has_listener(&self, msg_type: MsgType) -> bool {
        self.state.listeners.read().by_type.contains_key(&msg_type)
    }

    /// Encode in compact mode and send
    pub async fn send_command(&self, command: impl Into<Message>) -> Result<()> {
        let command = command.into();
        let text = command.encode(KeyMode::Compact)?;
        self.connection.send(text).await?;
        debug!(msg_type = %command.msg_type(), "trading command sent");
        Ok(())
    }

    pub async fn order(&self, order: NewOrderSingle) -> Result<()> {
        info!(
            cl_ord_id = %order.cl_ord_id,
            symbol = %order.symbol,
            side = ?order.side,
            ord_type = ?order.ord_type,
            "order sent"
        );
        self.send_command(order).await
    }

    pub async fn order_with(&self, params: OrderParams) -> Result<()> {
        self.order(commands::order(params)).await
    }

    pub async fn market_order(
        &self,
        account: u64,
        client_order_id: &str,
        symbol: &str,
        side: Side,
        qty: Decimal,
    ) -> Result<()> {
        self.order(commands::market_order(account, client_order_id, symbol, side, qty))
            .await
    }

    pub async fn limit_order(
        &self,
        account: u64,
        client_order_id: &str,
        symbol: &str,
        side: Side,
        price: Decimal,
        qty: Decimal,
    ) -> Result<()> {
        self.order(commands::limit_order(
            account,
            client_order_id,
            symbol,
            side,
            price,
            qty,
        ))
        .await
    }

    pub async fn stop_order(
        &self,
        account: u64,
        client_order_id: &str,
        symbol: &str,
        side: Side,
        stop_price: Decimal,
        qty: Decimal,
    ) -> Result<()> {
        self.order(commands::stop_order(
            account,
            client_order_id,
            symbol,
            side,
            stop_price,
            qty,
        ))
        .await
    }

    /// "Market if touched"
    pub async fn mit_order(
        &self,
        account: u64,
        client_order_id: &str,
        symbol: &str,
        side: Side,
        stop_price: Decimal,
        qty: Decimal,
    ) -> Result<()> {
        self.order(commands::mit_order(
            account,
            client_order_id,
            symbol,
            side,
            stop_price,
            qty,
        ))
        .await
    }

    /// Send an `OrderCancelRequest`; any other shape is rejected
    pub async fn cancel(&self, command: Message) -> Result<()> {
        if !matches!(command, Message::OrderCancelRequest(_)) {
            return Err(XenaError::InvalidArgument(format!(
                "Command has to be OrderCancelRequest, got {}",
                command.schema().name
            )));
        }
        self.send_command(command).await
    }

    /// Send an `OrderCancelReplaceRequest`; any other shape is rejected
    pub async fn replace(&self, command: Message) -> Result<()> {
        if !matches!(command, Message::OrderCancelReplaceRequest(_)) {
            return Err(XenaError::InvalidArgument(format!(
                "Command has to be OrderCancelReplaceRequest, got {}",
                command.schema().name
            )));
        }
        self.send_command(command).await
    }

    pub async fn cancel_by_client_id(
        &self,
        account: u64,
        cancel_id: &str,
        client_order_id: &str,
        symbol: &str,
        side: Side,
    ) -> Result<()> {
        let command =
            commands::cancel_by_client_id(account, cancel_id, client_order_id, symbol, side);
        self.cancel(command.into()).await
    }

    pub async fn cancel_by_order_id(
        &self,
        account: u64,
        cancel_id: &str,
        order_id: &str,
        symbol: &str,
        side: Side,
    ) -> Result<()> {
        let command = commands::cancel_by_order_id(account, cancel_id, order_id, symbol, side);
        self.cancel(command.into()).await
    }

    /// Cancel all orders of `account`, or only those on `symbol` when non-empty
    pub async fn mass_cancel(&self, account: u64, cl_ord_id: &str, symbol: &str) -> Result<()> {
        self.send_command(commands::mass_cancel(account, cl_ord_id, symbol))
            .await
    }

    /// Mass cancel restricted to one side and/or position effect
    pub async fn mass_cancel_filtered(
        &self,
        account: u64,
        cl_ord_id: &str,
        symbol: &str,
        side: Option<Side>,
        position_effect: Option<PositionEffect>,
    ) -> Result<()> {
        let command =
            commands::mass_cancel_filtered(account, cl_ord_id, symbol, side, position_effect);
        self.send_command(command).await
    }

    /// Request all orders; answered by `OrderMassStatusResponse`
    pub async fn orders(&self, account: u64) -> Result<()> {
        self.send_command(commands::orders_request(account, "")).await
    }

    /// Request all positions; answered by `MassPositionReport`
    pub async fn positions(&self, account: u64) -> Result<()> {
        self.send_command(commands::positions_request(account, ""))
            .await
    }

    /// Balances and margin; answered by `AccountStatusReport` and `MarginRequirementReport`
    pub async fn account_status_report(&self, account: u64, request_id: &str) -> Result<()> {
        self.send_command(commands::account_status_request(account, request_id))
            .await
    }

    /// Answered by `PositionMaintenanceReport`
    pub async fn collapse_positions(
        &self,
        account: u64,
        symbol: &str,
        request_id: &str,
    ) -> Result<()> {
        self.send_command(commands::collapse_positions(account, symbol, request_id))
            .await
    }

    pub async fn heartbeat(&self) -> Result<()> {
        self.send_command(commands::heartbeat()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MockLogonSigner;
    use crate::types::{ExecutionReport, Heartbeat, OrderCancelRequest};
    use tokio::sync::mpsc;

    fn offline_session() -> TradingSession {
        let builder = LogonBuilder::new("key", vec![1], Arc::new(MockLogonSigner::new("sig")));
        TradingSession::new(ConnectionConfig::new("ws://127.0.0.1:1"), builder)
    }

    fn recorder(
        tag: &'static str,
        tx: mpsc::UnboundedSender<&'static str>,
    ) -> impl Listener + 'static {
        move |_message: Message| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(tag);
            }
        }
    }

    #[test]
    fn test_duplicate_type_listener() {
        let session = offline_session();
        let noop = |_message: Message| async move {};
        session.listen_type(MsgType::ExecutionReport, noop).unwrap();
        let err = session
            .listen_type(MsgType::ExecutionReport, noop)
            .unwrap_err();
        assert!(matches!(err, XenaError::DuplicateListener(code) if code == "8"));

        session.remove_listener(MsgType::ExecutionReport);
        session.listen_type(MsgType::ExecutionReport, noop).unwrap();
        session.remove_listener(MsgType::Heartbeat);
    }

    #[test]
    fn test_duplicate_catch_all() {
        let session = offline_session();
        let noop = |_message: Message| async move {};
        session.listen(noop).unwrap();
        assert!(matches!(
            session.listen(noop),
            Err(XenaError::DuplicateListener(_))
        ));
    }

    #[test]
    fn test_listen_types_without_rollback() {
        let session = offline_session();
        let noop = |_message: Message| async move {};
        session.listen_type(MsgType::PositionReport, noop).unwrap();

        let result = session.listen_types(
            &[
                MsgType::ExecutionReport,
                MsgType::PositionReport,
                MsgType::OrderCancelReject,
            ],
            noop,
        );
        assert!(matches!(result, Err(XenaError::DuplicateListener(_))));
        assert!(session.has_listener(MsgType::ExecutionReport));
        assert!(!session.has_listener(MsgType::OrderCancelReject));
    }

    #[tokio::test]
    async fn test_dispatch_type_listener_before_catch_all() {
        let session = offline_session();
        let (tx, mut rx) = mpsc::unbounded_channel();
        session
            .listen_type(MsgType::ExecutionReport, recorder("typed", tx.clone()))
            .unwrap();
        session.listen(recorder("all", tx)).unwrap();

        session.state.handle_frame(r#"{"35":"8","11":"cl-1"}"#).await;
        session.state.handle_frame(r#"{"35":"0"}"#).await;

        assert_eq!(rx.try_recv().unwrap(), "typed");
        assert_eq!(rx.try_recv().unwrap(), "all");
        assert_eq!(rx.try_recv().unwrap(), "all");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_cancel_rejects_wrong_shape() {
        let session = offline_session();
        let result = session.cancel(Heartbeat::new().into()).await;
        assert!(matches!(result, Err(XenaError::InvalidArgument(_))));

        let result = session
            .replace(OrderCancelRequest::default().into())
            .await;
        assert!(matches!(result, Err(XenaError::InvalidArgument(_))));

        let result = session.replace(ExecutionReport::default().into()).await;
        assert!(matches!(result, Err(XenaError::InvalidArgument(_))));
        assert_eq!(session.state(), ConnectionState::Disconnected);
    }
}
