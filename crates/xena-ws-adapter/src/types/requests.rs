/*
[INPUT]:  Venue schema for client-to-venue commands
[OUTPUT]: Typed request structs with serde support and codec schema tables
[POS]:    Data layer - order entry, market-data subscription and query requests
[UPDATE]: When the venue schema changes or new commands are added
*/

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::enums::{
    MassCancelRequestType, MsgType, OrdType, PegOffsetType, PegPriceType, PosMaintAction,
    PosTransType, PositionEffect, Side, SubscriptionRequestType, ThrottleTimeUnit, ThrottleType,
    TimeInForce,
};
use super::models::{SLTP_SCHEMA, Sltp};
use crate::codec::{FieldSpec, Schema, WireMessage};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewOrderSingle {
    pub msg_type: MsgType,
    pub cl_ord_id: String,
    pub symbol: String,
    pub side: Option<Side>,
    pub transact_time: i64,
    pub account: u64,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub order_qty: Option<Decimal>,
    pub ord_type: Option<OrdType>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub price: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub stop_px: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub cap_price: Option<Decimal>,
    pub time_in_force: Option<TimeInForce>,
    pub exec_inst: Vec<String>,
    pub position_id: u64,
    pub position_effect: Option<PositionEffect>,
    pub peg_price_type: Option<PegPriceType>,
    pub peg_offset_type: Option<PegOffsetType>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub peg_offset_value: Option<Decimal>,
    pub sltp: Vec<Sltp>,
    pub text: String,
}

pub static NEW_ORDER_SINGLE_SCHEMA: Schema = Schema {
    name: "NewOrderSingle",
    fields: &[
        FieldSpec::msg_type(),
        FieldSpec::string("clOrdId", 11),
        FieldSpec::string("symbol", 55),
        FieldSpec::optional("side", 54),
        FieldSpec::int("transactTime", 60),
        FieldSpec::int("account", 1),
        FieldSpec::optional("orderQty", 38),
        FieldSpec::optional("ordType", 40),
        FieldSpec::optional("price", 44),
        FieldSpec::optional("stopPx", 99),
        FieldSpec::optional("capPrice", 1199),
        FieldSpec::optional("timeInForce", 59),
        FieldSpec::repeated("execInst", 18),
        FieldSpec::int("positionId", 2618),
        FieldSpec::optional("positionEffect", 77),
        FieldSpec::optional("pegPriceType", 1094),
        FieldSpec::optional("pegOffsetType", 836),
        FieldSpec::optional("pegOffsetValue", 211),
        FieldSpec::messages("sltp", 5000, &SLTP_SCHEMA),
        FieldSpec::string("text", 58),
    ],
};

impl WireMessage for NewOrderSingle {
    const SCHEMA: &'static Schema = &NEW_ORDER_SINGLE_SCHEMA;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewOrderList {
    pub msg_type: MsgType,
    pub list_id: String,
    pub contingency_type: String,
    pub orders: Vec<NewOrderSingle>,
}

pub static NEW_ORDER_LIST_SCHEMA: Schema = Schema {
    name: "NewOrderList",
    fields: &[
        FieldSpec::msg_type(),
        FieldSpec::string("listId", 66),
        FieldSpec::string("contingencyType", 1385),
        FieldSpec::messages("orders", 73, &NEW_ORDER_SINGLE_SCHEMA),
    ],
};

impl WireMessage for NewOrderList {
    const SCHEMA: &'static Schema = &NEW_ORDER_LIST_SCHEMA;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderCancelRequest {
    pub msg_type: MsgType,
    pub cl_ord_id: String,
    pub orig_cl_ord_id: String,
    pub order_id: String,
    pub symbol: String,
    pub side: Option<Side>,
    pub transact_time: i64,
    pub account: u64,
}

pub static ORDER_CANCEL_REQUEST_SCHEMA: Schema = Schema {
    name: "OrderCancelRequest",
    fields: &[
        FieldSpec::msg_type(),
        FieldSpec::string("clOrdId", 11),
        FieldSpec::string("origClOrdId", 41),
        FieldSpec::string("orderId", 37),
        FieldSpec::string("symbol", 55),
        FieldSpec::optional("side", 54),
        FieldSpec::int("transactTime", 60),
        FieldSpec::int("account", 1),
    ],
};

impl WireMessage for OrderCancelRequest {
    const SCHEMA: &'static Schema = &ORDER_CANCEL_REQUEST_SCHEMA;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderCancelReplaceRequest {
    pub msg_type: MsgType,
    pub cl_ord_id: String,
    pub orig_cl_ord_id: String,
    pub order_id: String,
    pub symbol: String,
    pub side: Option<Side>,
    pub transact_time: i64,
    pub account: u64,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub order_qty: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub price: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub stop_px: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub cap_price: Option<Decimal>,
    pub peg_price_type: Option<PegPriceType>,
    pub peg_offset_type: Option<PegOffsetType>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub peg_offset_value: Option<Decimal>,
    pub sltp: Vec<Sltp>,
}

pub static ORDER_CANCEL_REPLACE_REQUEST_SCHEMA: Schema = Schema {
    name: "OrderCancelReplaceRequest",
    fields: &[
        FieldSpec::msg_type(),
        FieldSpec::string("clOrdId", 11),
        FieldSpec::string("origClOrdId", 41),
        FieldSpec::string("orderId", 37),
        FieldSpec::string("symbol", 55),
        FieldSpec::optional("side", 54),
        FieldSpec::int("transactTime", 60),
        FieldSpec::int("account", 1),
        FieldSpec::optional("orderQty", 38),
        FieldSpec::optional("price", 44),
        FieldSpec::optional("stopPx", 99),
        FieldSpec::optional("capPrice", 1199),
        FieldSpec::optional("pegPriceType", 1094),
        FieldSpec::optional("pegOffsetType", 836),
        FieldSpec::optional("pegOffsetValue", 211),
        FieldSpec::messages("sltp", 5000, &SLTP_SCHEMA),
    ],
};

impl WireMessage for OrderCancelReplaceRequest {
    const SCHEMA: &'static Schema = &ORDER_CANCEL_REPLACE_REQUEST_SCHEMA;
}

/// Single order status (`H`) or mass status (`AF`) request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderStatusRequest {
    pub msg_type: MsgType,
    pub account: u64,
    pub cl_ord_id: String,
    pub order_id: String,
    pub mass_status_req_id: String,
}

pub static ORDER_STATUS_REQUEST_SCHEMA: Schema = Schema {
    name: "OrderStatusRequest",
    fields: &[
        FieldSpec::msg_type(),
        FieldSpec::int("account", 1),
        FieldSpec::string("clOrdId", 11),
        FieldSpec::string("orderId", 37),
        FieldSpec::string("massStatusReqId", 584),
    ],
};

impl WireMessage for OrderStatusRequest {
    const SCHEMA: &'static Schema = &ORDER_STATUS_REQUEST_SCHEMA;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderMassCancelRequest {
    pub msg_type: MsgType,
    pub mass_cancel_request_type: Option<MassCancelRequestType>,
    pub cl_ord_id: String,
    pub account: u64,
    pub symbol: String,
    pub side: Option<Side>,
    pub position_effect: Option<PositionEffect>,
    pub transact_time: i64,
}

pub static ORDER_MASS_CANCEL_REQUEST_SCHEMA: Schema = Schema {
    name: "OrderMassCancelRequest",
    fields: &[
        FieldSpec::msg_type(),
        FieldSpec::optional("massCancelRequestType", 530),
        FieldSpec::string("clOrdId", 11),
        FieldSpec::int("account", 1),
        FieldSpec::string("symbol", 55),
        FieldSpec::optional("side", 54),
        FieldSpec::optional("positionEffect", 77),
        FieldSpec::int("transactTime", 60),
    ],
};

impl WireMessage for OrderMassCancelRequest {
    const SCHEMA: &'static Schema = &ORDER_MASS_CANCEL_REQUEST_SCHEMA;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarketDataRequest {
    pub msg_type: MsgType,
    pub md_stream_id: String,
    pub subscription_request_type: Option<SubscriptionRequestType>,
    pub throttle_type: Option<ThrottleType>,
    pub throttle_time_interval: i64,
    pub throttle_time_unit: Option<ThrottleTimeUnit>,
    /// Price aggregation step for book streams, 0 = venue default
    pub aggregated_book: i64,
    pub market_depth: i64,
}

pub static MARKET_DATA_REQUEST_SCHEMA: Schema = Schema {
    name: "MarketDataRequest",
    fields: &[
        FieldSpec::msg_type(),
        FieldSpec::string("mdStreamId", 1500),
        FieldSpec::optional("subscriptionRequestType", 263),
        FieldSpec::optional("throttleType", 1612),
        FieldSpec::int("throttleTimeInterval", 1614),
        FieldSpec::optional("throttleTimeUnit", 1615),
        FieldSpec::int("aggregatedBook", 266),
        FieldSpec::int("marketDepth", 264),
    ],
};

impl WireMessage for MarketDataRequest {
    const SCHEMA: &'static Schema = &MARKET_DATA_REQUEST_SCHEMA;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountStatusReportRequest {
    pub msg_type: MsgType,
    pub account: u64,
    pub account_status_request_id: String,
}

pub static ACCOUNT_STATUS_REPORT_REQUEST_SCHEMA: Schema = Schema {
    name: "AccountStatusReportRequest",
    fields: &[
        FieldSpec::msg_type(),
        FieldSpec::int("account", 1),
        FieldSpec::string("accountStatusRequestId", 5090),
    ],
};

impl WireMessage for AccountStatusReportRequest {
    const SCHEMA: &'static Schema = &ACCOUNT_STATUS_REPORT_REQUEST_SCHEMA;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PositionsRequest {
    pub msg_type: MsgType,
    pub account: u64,
    pub pos_req_id: String,
    pub symbol: String,
}

pub static POSITIONS_REQUEST_SCHEMA: Schema = Schema {
    name: "PositionsRequest",
    fields: &[
        FieldSpec::msg_type(),
        FieldSpec::int("account", 1),
        FieldSpec::string("posReqId", 710),
        FieldSpec::string("symbol", 55),
    ],
};

impl WireMessage for PositionsRequest {
    const SCHEMA: &'static Schema = &POSITIONS_REQUEST_SCHEMA;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PositionMaintenanceRequest {
    pub msg_type: MsgType,
    pub pos_req_id: String,
    pub account: u64,
    pub symbol: String,
    pub pos_trans_type: Option<PosTransType>,
    pub pos_maint_action: Option<PosMaintAction>,
    pub position_id: u64,
    pub transact_time: i64,
}

pub static POSITION_MAINTENANCE_REQUEST_SCHEMA: Schema = Schema {
    name: "PositionMaintenanceRequest",
    fields: &[
        FieldSpec::msg_type(),
        FieldSpec::string("posReqId", 710),
        FieldSpec::int("account", 1),
        FieldSpec::string("symbol", 55),
        FieldSpec::optional("posTransType", 709),
        FieldSpec::optional("posMaintAction", 712),
        FieldSpec::int("positionId", 2618),
        FieldSpec::int("transactTime", 60),
    ],
};

impl WireMessage for PositionMaintenanceRequest {
    const SCHEMA: &'static Schema = &POSITION_MAINTENANCE_REQUEST_SCHEMA;
}
