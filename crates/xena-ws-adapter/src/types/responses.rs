/*
[INPUT]:  Venue schema for venue-to-client reports
[OUTPUT]: Typed response structs with serde support and codec schema tables
[POS]:    Data layer - execution, market data, balance, position and margin reports
[UPDATE]: When the venue schema changes or new reports are added
*/

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::enums::{
    ExecType, MassCancelRequestType, MsgType, OrdStatus, OrdType, PegOffsetType, PegPriceType,
    PosMaintAction, PosTransType, PositionEffect, Side, TimeInForce,
};
use super::models::{
    BALANCE_SCHEMA, Balance, COMMISSION_SCHEMA, Commission, MARGIN_AMOUNT_SCHEMA, MD_ENTRY_SCHEMA,
    MarginAmount, MdEntry, SLTP_SCHEMA, Sltp,
};
use crate::codec::{FieldSpec, Schema, WireMessage};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutionReport {
    pub msg_type: MsgType,
    pub account: u64,
    pub cl_ord_id: String,
    pub orig_cl_ord_id: String,
    pub order_id: String,
    pub exec_id: String,
    pub exec_type: Option<ExecType>,
    pub ord_status: Option<OrdStatus>,
    pub ord_rej_reason: String,
    pub symbol: String,
    pub side: Option<Side>,
    pub ord_type: Option<OrdType>,
    pub time_in_force: Option<TimeInForce>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub price: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub stop_px: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub cap_price: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub order_qty: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub leaves_qty: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub cum_qty: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub last_qty: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub last_px: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub avg_px: Option<Decimal>,
    pub position_id: u64,
    pub position_effect: Option<PositionEffect>,
    pub exec_inst: Vec<String>,
    pub peg_price_type: Option<PegPriceType>,
    pub peg_offset_type: Option<PegOffsetType>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub peg_offset_value: Option<Decimal>,
    pub sltp: Vec<Sltp>,
    pub commission: Commission,
    pub text: String,
    pub transact_time: i64,
}

pub static EXECUTION_REPORT_SCHEMA: Schema = Schema {
    name: "ExecutionReport",
    fields: &[
        FieldSpec::msg_type(),
        FieldSpec::int("account", 1),
        FieldSpec::string("clOrdId", 11),
        FieldSpec::string("origClOrdId", 41),
        FieldSpec::string("orderId", 37),
        FieldSpec::string("execId", 17),
        FieldSpec::optional("execType", 150),
        FieldSpec::optional("ordStatus", 39),
        FieldSpec::string("ordRejReason", 103),
        FieldSpec::string("symbol", 55),
        FieldSpec::optional("side", 54),
        FieldSpec::optional("ordType", 40),
        FieldSpec::optional("timeInForce", 59),
        FieldSpec::optional("price", 44),
        FieldSpec::optional("stopPx", 99),
        FieldSpec::optional("capPrice", 1199),
        FieldSpec::optional("orderQty", 38),
        FieldSpec::optional("leavesQty", 151),
        FieldSpec::optional("cumQty", 14),
        FieldSpec::optional("lastQty", 32),
        FieldSpec::optional("lastPx", 31),
        FieldSpec::optional("avgPx", 6),
        FieldSpec::int("positionId", 2618),
        FieldSpec::optional("positionEffect", 77),
        FieldSpec::repeated("execInst", 18),
        FieldSpec::optional("pegPriceType", 1094),
        FieldSpec::optional("pegOffsetType", 836),
        FieldSpec::optional("pegOffsetValue", 211),
        FieldSpec::messages("sltp", 5000, &SLTP_SCHEMA),
        FieldSpec::message("commission", 5010, &COMMISSION_SCHEMA),
        FieldSpec::string("text", 58),
        FieldSpec::int("transactTime", 60),
    ],
};

impl WireMessage for ExecutionReport {
    const SCHEMA: &'static Schema = &EXECUTION_REPORT_SCHEMA;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderCancelReject {
    pub msg_type: MsgType,
    pub account: u64,
    pub cl_ord_id: String,
    pub orig_cl_ord_id: String,
    pub order_id: String,
    pub ord_status: Option<OrdStatus>,
    pub cxl_rej_response_to: String,
    pub cxl_rej_reason: String,
    pub symbol: String,
    pub text: String,
    pub transact_time: i64,
}

pub static ORDER_CANCEL_REJECT_SCHEMA: Schema = Schema {
    name: "OrderCancelReject",
    fields: &[
        FieldSpec::msg_type(),
        FieldSpec::int("account", 1),
        FieldSpec::string("clOrdId", 11),
        FieldSpec::string("origClOrdId", 41),
        FieldSpec::string("orderId", 37),
        FieldSpec::optional("ordStatus", 39),
        FieldSpec::string("cxlRejResponseTo", 434),
        FieldSpec::string("cxlRejReason", 102),
        FieldSpec::string("symbol", 55),
        FieldSpec::string("text", 58),
        FieldSpec::int("transactTime", 60),
    ],
};

impl WireMessage for OrderCancelReject {
    const SCHEMA: &'static Schema = &ORDER_CANCEL_REJECT_SCHEMA;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListStatus {
    pub msg_type: MsgType,
    pub list_id: String,
    pub list_status_type: String,
    pub list_order_status: String,
    pub orders: Vec<ExecutionReport>,
    pub text: String,
    pub transact_time: i64,
}

pub static LIST_STATUS_SCHEMA: Schema = Schema {
    name: "ListStatus",
    fields: &[
        FieldSpec::msg_type(),
        FieldSpec::string("listId", 66),
        FieldSpec::string("listStatusType", 429),
        FieldSpec::string("listOrderStatus", 431),
        FieldSpec::messages("orders", 73, &EXECUTION_REPORT_SCHEMA),
        FieldSpec::string("text", 58),
        FieldSpec::int("transactTime", 60),
    ],
};

impl WireMessage for ListStatus {
    const SCHEMA: &'static Schema = &LIST_STATUS_SCHEMA;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderMassStatusResponse {
    pub msg_type: MsgType,
    pub mass_status_req_id: String,
    pub account: u64,
    pub orders: Vec<ExecutionReport>,
    pub reject_reason: String,
    pub text: String,
}

pub static ORDER_MASS_STATUS_RESPONSE_SCHEMA: Schema = Schema {
    name: "OrderMassStatusResponse",
    fields: &[
        FieldSpec::msg_type(),
        FieldSpec::string("massStatusReqId", 584),
        FieldSpec::int("account", 1),
        FieldSpec::messages("orders", 73, &EXECUTION_REPORT_SCHEMA),
        FieldSpec::string("rejectReason", 1328),
        FieldSpec::string("text", 58),
    ],
};

impl WireMessage for OrderMassStatusResponse {
    const SCHEMA: &'static Schema = &ORDER_MASS_STATUS_RESPONSE_SCHEMA;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderMassCancelReport {
    pub msg_type: MsgType,
    pub mass_cancel_request_type: Option<MassCancelRequestType>,
    pub cl_ord_id: String,
    pub account: u64,
    pub symbol: String,
    pub mass_cancel_response: String,
    pub mass_cancel_reject_reason: String,
    pub total_affected_orders: i64,
    pub text: String,
    pub transact_time: i64,
}

pub static ORDER_MASS_CANCEL_REPORT_SCHEMA: Schema = Schema {
    name: "OrderMassCancelReport",
    fields: &[
        FieldSpec::msg_type(),
        FieldSpec::optional("massCancelRequestType", 530),
        FieldSpec::string("clOrdId", 11),
        FieldSpec::int("account", 1),
        FieldSpec::string("symbol", 55),
        FieldSpec::string("massCancelResponse", 531),
        FieldSpec::string("massCancelRejectReason", 532),
        FieldSpec::int("totalAffectedOrders", 533),
        FieldSpec::string("text", 58),
        FieldSpec::int("transactTime", 60),
    ],
};

impl WireMessage for OrderMassCancelReport {
    const SCHEMA: &'static Schema = &ORDER_MASS_CANCEL_REPORT_SCHEMA;
}

/// Snapshot (`W`), incremental (`X`) and trade capture (`AE`) refresh
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarketDataRefresh {
    pub msg_type: MsgType,
    pub md_stream_id: String,
    pub symbol: String,
    pub md_book_type: String,
    pub last_update_time: i64,
    pub md_entry: Vec<MdEntry>,
}

pub static MARKET_DATA_REFRESH_SCHEMA: Schema = Schema {
    name: "MarketDataRefresh",
    fields: &[
        FieldSpec::msg_type(),
        FieldSpec::string("mdStreamId", 1500),
        FieldSpec::string("symbol", 55),
        FieldSpec::string("mdBookType", 1021),
        FieldSpec::int("lastUpdateTime", 779),
        FieldSpec::messages("mdEntry", 268, &MD_ENTRY_SCHEMA),
    ],
};

impl WireMessage for MarketDataRefresh {
    const SCHEMA: &'static Schema = &MARKET_DATA_REFRESH_SCHEMA;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarketDataRequestReject {
    pub msg_type: MsgType,
    pub md_stream_id: String,
    pub md_req_rej_reason: String,
    pub text: String,
}

pub static MARKET_DATA_REQUEST_REJECT_SCHEMA: Schema = Schema {
    name: "MarketDataRequestReject",
    fields: &[
        FieldSpec::msg_type(),
        FieldSpec::string("mdStreamId", 1500),
        FieldSpec::string("mdReqRejReason", 281),
        FieldSpec::string("text", 58),
    ],
};

impl WireMessage for MarketDataRequestReject {
    const SCHEMA: &'static Schema = &MARKET_DATA_REQUEST_REJECT_SCHEMA;
}

/// Account status report (`XAR`) and balance update (`XAF`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BalanceIncrementalRefresh {
    pub msg_type: MsgType,
    pub account: u64,
    pub account_status_request_id: String,
    pub balances: Vec<Balance>,
    pub last_update_time: i64,
    pub reject_reason: String,
    pub text: String,
}

pub static BALANCE_INCREMENTAL_REFRESH_SCHEMA: Schema = Schema {
    name: "BalanceIncrementalRefresh",
    fields: &[
        FieldSpec::msg_type(),
        FieldSpec::int("account", 1),
        FieldSpec::string("accountStatusRequestId", 5090),
        FieldSpec::messages("balances", 5091, &BALANCE_SCHEMA),
        FieldSpec::int("lastUpdateTime", 779),
        FieldSpec::string("rejectReason", 1328),
        FieldSpec::string("text", 58),
    ],
};

impl WireMessage for BalanceIncrementalRefresh {
    const SCHEMA: &'static Schema = &BALANCE_INCREMENTAL_REFRESH_SCHEMA;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PositionReport {
    pub msg_type: MsgType,
    pub account: u64,
    pub position_id: u64,
    pub pos_req_id: String,
    pub symbol: String,
    pub side: Option<Side>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub avg_px: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub long_qty: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub short_qty: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub settl_price: Option<Decimal>,
    pub text: String,
    pub transact_time: i64,
}

pub static POSITION_REPORT_SCHEMA: Schema = Schema {
    name: "PositionReport",
    fields: &[
        FieldSpec::msg_type(),
        FieldSpec::int("account", 1),
        FieldSpec::int("positionId", 2618),
        FieldSpec::string("posReqId", 710),
        FieldSpec::string("symbol", 55),
        FieldSpec::optional("side", 54),
        FieldSpec::optional("avgPx", 6),
        FieldSpec::optional("longQty", 704),
        FieldSpec::optional("shortQty", 705),
        FieldSpec::optional("settlPrice", 730),
        FieldSpec::string("text", 58),
        FieldSpec::int("transactTime", 60),
    ],
};

impl WireMessage for PositionReport {
    const SCHEMA: &'static Schema = &POSITION_REPORT_SCHEMA;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MassPositionReport {
    pub msg_type: MsgType,
    pub account: u64,
    pub pos_req_id: String,
    pub open_positions: Vec<PositionReport>,
    pub reject_reason: String,
    pub text: String,
}

pub static MASS_POSITION_REPORT_SCHEMA: Schema = Schema {
    name: "MassPositionReport",
    fields: &[
        FieldSpec::msg_type(),
        FieldSpec::int("account", 1),
        FieldSpec::string("posReqId", 710),
        FieldSpec::messages("openPositions", 727, &POSITION_REPORT_SCHEMA),
        FieldSpec::string("rejectReason", 1328),
        FieldSpec::string("text", 58),
    ],
};

impl WireMessage for MassPositionReport {
    const SCHEMA: &'static Schema = &MASS_POSITION_REPORT_SCHEMA;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PositionMaintenanceReport {
    pub msg_type: MsgType,
    pub pos_req_id: String,
    pub account: u64,
    pub symbol: String,
    pub pos_trans_type: Option<PosTransType>,
    pub pos_maint_action: Option<PosMaintAction>,
    pub pos_maint_status: String,
    pub position_id: u64,
    pub text: String,
    pub transact_time: i64,
}

pub static POSITION_MAINTENANCE_REPORT_SCHEMA: Schema = Schema {
    name: "PositionMaintenanceReport",
    fields: &[
        FieldSpec::msg_type(),
        FieldSpec::string("posReqId", 710),
        FieldSpec::int("account", 1),
        FieldSpec::string("symbol", 55),
        FieldSpec::optional("posTransType", 709),
        FieldSpec::optional("posMaintAction", 712),
        FieldSpec::string("posMaintStatus", 722),
        FieldSpec::int("positionId", 2618),
        FieldSpec::string("text", 58),
        FieldSpec::int("transactTime", 60),
    ],
};

impl WireMessage for PositionMaintenanceReport {
    const SCHEMA: &'static Schema = &POSITION_MAINTENANCE_REPORT_SCHEMA;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarginRequirementReport {
    pub msg_type: MsgType,
    pub account: u64,
    pub margin_reqmt_rpt_type: String,
    pub settl_currency: String,
    pub margin_amounts: Vec<MarginAmount>,
    pub last_update_time: i64,
}

pub static MARGIN_REQUIREMENT_REPORT_SCHEMA: Schema = Schema {
    name: "MarginRequirementReport",
    fields: &[
        FieldSpec::msg_type(),
        FieldSpec::int("account", 1),
        FieldSpec::string("marginReqmtRptType", 1635),
        FieldSpec::string("settlCurrency", 120),
        FieldSpec::messages("marginAmounts", 1643, &MARGIN_AMOUNT_SCHEMA),
        FieldSpec::int("lastUpdateTime", 779),
    ],
};

impl WireMessage for MarginRequirementReport {
    const SCHEMA: &'static Schema = &MARGIN_REQUIREMENT_REPORT_SCHEMA;
}
