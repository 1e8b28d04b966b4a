/*
[INPUT]:  Primitive order arguments (account, symbol, side, prices, quantities)
[OUTPUT]: Typed command messages ready for the trading session
[POS]:    Command layer - pure builders, no I/O
[UPDATE]: When order entry options or query commands change
*/

use chrono::Utc;
use rust_decimal::Decimal;

use crate::types::{
    AccountStatusReportRequest, ExecutionReport, Heartbeat, MassCancelRequestType, MsgType,
    NewOrderSingle, OrdType, OrderCancelReplaceRequest, OrderCancelRequest, OrderMassCancelRequest,
    OrderStatusRequest, PegOffsetType, PegPriceType, PosMaintAction, PosTransType,
    PositionEffect, PositionMaintenanceRequest, PositionsRequest, Side, Sltp, TimeInForce,
};

/// Current time as nanoseconds since the Unix epoch
pub fn now_nanos() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or_default()
}

/// Arguments for [`order`]
#[derive(Debug, Clone)]
pub struct OrderParams {
    pub account: u64,
    pub client_order_id: String,
    pub ord_type: OrdType,
    pub symbol: String,
    pub side: Side,
    pub qty: Decimal,
    pub price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub position_id: Option<u64>,
    pub stop_loss_price: Option<Decimal>,
    pub take_profit_price: Option<Decimal>,
    /// Trailing stop offset in basis points
    pub trailing_offset: Option<Decimal>,
    pub cap_price: Option<Decimal>,
    pub time_in_force: Option<TimeInForce>,
    pub exec_inst: Vec<String>,
}

impl OrderParams {
    pub fn new(
        account: u64,
        client_order_id: impl Into<String>,
        ord_type: OrdType,
        symbol: impl Into<String>,
        side: Side,
        qty: Decimal,
    ) -> Self {
        Self {
            account,
            client_order_id: client_order_id.into(),
            ord_type,
            symbol: symbol.into(),
            side,
            qty,
            price: None,
            stop_price: None,
            position_id: None,
            stop_loss_price: None,
            take_profit_price: None,
            trailing_offset: None,
            cap_price: None,
            time_in_force: None,
            exec_inst: Vec::new(),
        }
    }

    pub fn market(
        account: u64,
        client_order_id: impl Into<String>,
        symbol: impl Into<String>,
        side: Side,
        qty: Decimal,
    ) -> Self {
        Self::new(account, client_order_id, OrdType::Market, symbol, side, qty)
    }

    pub fn limit(
        account: u64,
        client_order_id: impl Into<String>,
        symbol: impl Into<String>,
        side: Side,
        price: Decimal,
        qty: Decimal,
    ) -> Self {
        Self::new(account, client_order_id, OrdType::Limit, symbol, side, qty).price(price)
    }

    pub fn stop(
        account: u64,
        client_order_id: impl Into<String>,
        symbol: impl Into<String>,
        side: Side,
        stop_price: Decimal,
        qty: Decimal,
    ) -> Self {
        Self::new(account, client_order_id, OrdType::Stop, symbol, side, qty).stop_price(stop_price)
    }

    /// "Market if touched"
    pub fn mit(
        account: u64,
        client_order_id: impl Into<String>,
        symbol: impl Into<String>,
        side: Side,
        stop_price: Decimal,
        qty: Decimal,
    ) -> Self {
        Self::new(account, client_order_id, OrdType::MarketIfTouched, symbol, side, qty)
            .stop_price(stop_price)
    }

    pub fn price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    pub fn stop_price(mut self, stop_price: Decimal) -> Self {
        self.stop_price = Some(stop_price);
        self
    }

    /// Close an existing position
    pub fn position(mut self, position_id: u64) -> Self {
        self.position_id = Some(position_id);
        self
    }

    pub fn stop_loss(mut self, stop_price: Decimal) -> Self {
        self.stop_loss_price = Some(stop_price);
        self
    }

    pub fn take_profit(mut self, price: Decimal) -> Self {
        self.take_profit_price = Some(price);
        self
    }

    pub fn trailing_stop(mut self, offset: Decimal, cap_price: Option<Decimal>) -> Self {
        self.trailing_offset = Some(offset);
        self.cap_price = cap_price;
        self
    }

    pub fn time_in_force(mut self, time_in_force: TimeInForce) -> Self {
        self.time_in_force = Some(time_in_force);
        self
    }

    pub fn exec_inst(mut self, inst: impl Into<String>) -> Self {
        self.exec_inst.push(inst.into());
        self
    }
}

/// Build a `NewOrderSingle`
pub fn order(params: OrderParams) -> NewOrderSingle {
    let mut cmd = NewOrderSingle {
        msg_type: MsgType::NewOrderSingle,
        ord_type: Some(params.ord_type),
        cl_ord_id: params.client_order_id,
        symbol: params.symbol,
        side: Some(params.side),
        transact_time: now_nanos(),
        order_qty: Some(params.qty),
        account: params.account,
        price: params.price,
        stop_px: params.stop_price,
        time_in_force: params.time_in_force,
        exec_inst: params.exec_inst,
        ..Default::default()
    };

    if let Some(position_id) = params.position_id {
        for_position(&mut cmd, position_id);
    }
    if let Some(stop_price) = params.stop_loss_price {
        add_stop_loss(&mut cmd, stop_price);
    }
    if let Some(price) = params.take_profit_price {
        add_take_profit(&mut cmd, price);
    }
    if let Some(offset) = params.trailing_offset {
        add_trailing_stop_loss(&mut cmd, offset, params.cap_price);
    }

    cmd
}

pub fn market_order(
    account: u64,
    client_order_id: impl Into<String>,
    symbol: impl Into<String>,
    side: Side,
    qty: Decimal,
) -> NewOrderSingle {
    order(OrderParams::market(account, client_order_id, symbol, side, qty))
}

pub fn limit_order(
    account: u64,
    client_order_id: impl Into<String>,
    symbol: impl Into<String>,
    side: Side,
    price: Decimal,
    qty: Decimal,
) -> NewOrderSingle {
    order(OrderParams::limit(account, client_order_id, symbol, side, price, qty))
}

pub fn stop_order(
    account: u64,
    client_order_id: impl Into<String>,
    symbol: impl Into<String>,
    side: Side,
    stop_price: Decimal,
    qty: Decimal,
) -> NewOrderSingle {
    order(OrderParams::stop(account, client_order_id, symbol, side, stop_price, qty))
}

pub fn mit_order(
    account: u64,
    client_order_id: impl Into<String>,
    symbol: impl Into<String>,
    side: Side,
    stop_price: Decimal,
    qty: Decimal,
) -> NewOrderSingle {
    order(OrderParams::mit(account, client_order_id, symbol, side, stop_price, qty))
}

/// Turn the order into a close of `position_id`
pub fn for_position(cmd: &mut NewOrderSingle, position_id: u64) {
    cmd.position_id = position_id;
    cmd.position_effect = Some(PositionEffect::Close);
}

pub fn add_stop_loss(cmd: &mut NewOrderSingle, stop_price: Decimal) {
    cmd.sltp.push(Sltp {
        ord_type: Some(OrdType::Stop),
        stop_px: Some(stop_price),
        ..Default::default()
    });
}

pub fn add_take_profit(cmd: &mut NewOrderSingle, price: Decimal) {
    cmd.sltp.push(Sltp {
        ord_type: Some(OrdType::Limit),
        price: Some(price),
        ..Default::default()
    });
}

/// Trailing stop-loss template, `offset` in basis points
pub fn add_trailing_stop_loss(cmd: &mut NewOrderSingle, offset: Decimal, cap_price: Option<Decimal>) {
    cmd.sltp.push(Sltp {
        ord_type: Some(OrdType::Stop),
        peg_price_type: Some(PegPriceType::TrailingStopPeg),
        peg_offset_type: Some(PegOffsetType::BasisPoints),
        peg_offset_value: Some(offset),
        cap_price,
        ..Default::default()
    });
}

pub fn cancel_from_execution_report(
    cancel_id: impl Into<String>,
    report: &ExecutionReport,
) -> OrderCancelRequest {
    OrderCancelRequest {
        msg_type: MsgType::OrderCancelRequest,
        cl_ord_id: cancel_id.into(),
        orig_cl_ord_id: report.cl_ord_id.clone(),
        symbol: report.symbol.clone(),
        side: report.side.clone(),
        transact_time: now_nanos(),
        account: report.account,
        ..Default::default()
    }
}

/// Replace request carrying the report's current prices, quantity and SL/TP legs
pub fn replace_from_execution_report(
    replace_id: impl Into<String>,
    report: &ExecutionReport,
) -> OrderCancelReplaceRequest {
    OrderCancelReplaceRequest {
        msg_type: MsgType::OrderCancelReplaceRequest,
        cl_ord_id: replace_id.into(),
        orig_cl_ord_id: report.cl_ord_id.clone(),
        symbol: report.symbol.clone(),
        side: report.side.clone(),
        transact_time: now_nanos(),
        account: report.account,
        price: report.price,
        stop_px: report.stop_px,
        cap_price: report.cap_price,
        order_qty: report.order_qty,
        peg_price_type: report.peg_price_type.clone(),
        peg_offset_type: report.peg_offset_type.clone(),
        peg_offset_value: report.peg_offset_value,
        sltp: report.sltp.clone(),
        ..Default::default()
    }
}

/// Cancel by the client id of the original order
pub fn cancel_by_client_id(
    account: u64,
    cancel_id: impl Into<String>,
    client_order_id: impl Into<String>,
    symbol: impl Into<String>,
    side: Side,
) -> OrderCancelRequest {
    OrderCancelRequest {
        msg_type: MsgType::OrderCancelRequest,
        cl_ord_id: cancel_id.into(),
        orig_cl_ord_id: client_order_id.into(),
        symbol: symbol.into(),
        side: Some(side),
        transact_time: now_nanos(),
        account,
        ..Default::default()
    }
}

/// Cancel by the venue-assigned order id
pub fn cancel_by_order_id(
    account: u64,
    cancel_id: impl Into<String>,
    order_id: impl Into<String>,
    symbol: impl Into<String>,
    side: Side,
) -> OrderCancelRequest {
    OrderCancelRequest {
        msg_type: MsgType::OrderCancelRequest,
        cl_ord_id: cancel_id.into(),
        order_id: order_id.into(),
        symbol: symbol.into(),
        side: Some(side),
        transact_time: now_nanos(),
        account,
        ..Default::default()
    }
}

/// Cancel every open order of `account`, narrowed to `symbol` when non-empty
pub fn mass_cancel(
    account: u64,
    cl_ord_id: impl Into<String>,
    symbol: impl Into<String>,
) -> OrderMassCancelRequest {
    mass_cancel_filtered(account, cl_ord_id, symbol, None, None)
}

/// Mass cancel further narrowed by side and position effect.
///
/// The request type is `CancelOrdersForASecurity` with a symbol and
/// `CancelAllOrders` without one.
pub fn mass_cancel_filtered(
    account: u64,
    cl_ord_id: impl Into<String>,
    symbol: impl Into<String>,
    side: Option<Side>,
    position_effect: Option<PositionEffect>,
) -> OrderMassCancelRequest {
    let symbol = symbol.into();
    let request_type = if symbol.is_empty() {
        MassCancelRequestType::CancelAllOrders
    } else {
        MassCancelRequestType::CancelOrdersForASecurity
    };
    OrderMassCancelRequest {
        msg_type: MsgType::OrderMassCancelRequest,
        mass_cancel_request_type: Some(request_type),
        cl_ord_id: cl_ord_id.into(),
        account,
        symbol,
        side,
        position_effect,
        transact_time: now_nanos(),
    }
}

/// Mass order status request, answered by `OrderMassStatusResponse`
pub fn orders_request(account: u64, request_id: impl Into<String>) -> OrderStatusRequest {
    OrderStatusRequest {
        msg_type: MsgType::OrderMassStatusRequest,
        account,
        mass_status_req_id: request_id.into(),
        ..Default::default()
    }
}

/// Answered by `MassPositionReport`
pub fn positions_request(account: u64, request_id: impl Into<String>) -> PositionsRequest {
    PositionsRequest {
        msg_type: MsgType::RequestForPositions,
        account,
        pos_req_id: request_id.into(),
        ..Default::default()
    }
}

/// Answered by `AccountStatusReport` and `MarginRequirementReport`
pub fn account_status_request(
    account: u64,
    request_id: impl Into<String>,
) -> AccountStatusReportRequest {
    AccountStatusReportRequest {
        msg_type: MsgType::AccountStatusReportRequest,
        account,
        account_status_request_id: request_id.into(),
    }
}

/// Answered by `PositionMaintenanceReport`
pub fn collapse_positions(
    account: u64,
    symbol: impl Into<String>,
    request_id: impl Into<String>,
) -> PositionMaintenanceRequest {
    PositionMaintenanceRequest {
        msg_type: MsgType::PositionMaintenanceRequest,
        pos_req_id: request_id.into(),
        account,
        symbol: symbol.into(),
        pos_trans_type: Some(PosTransType::Collapse),
        pos_maint_action: Some(PosMaintAction::Replace),
        transact_time: now_nanos(),
        ..Default::default()
    }
}

pub fn heartbeat() -> Heartbeat {
    Heartbeat {
        transact_time: now_nanos(),
        ..Heartbeat::new()
    }
}
