/*
[INPUT]:  Venue schema for session-level messages and nested components
[OUTPUT]: Typed Rust structs with serde support and codec schema tables
[POS]:    Data layer - Logon/Heartbeat/Reject plus shared nested groups
[UPDATE]: When the venue schema changes or new components are added
*/

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::enums::{MdEntryType, MdUpdateAction, MsgType, OrdType, PegOffsetType, PegPriceType, Side};
use crate::codec::{FieldSpec, Schema, WireMessage};

/// Login request (outbound) and login acknowledgment (inbound)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Logon {
    pub msg_type: MsgType,
    /// Keepalive interval in seconds requested by the server
    pub heart_bt_int: i64,
    pub username: String,
    pub password: String,
    pub raw_data: String,
    /// Nanoseconds since epoch
    pub sending_time: i64,
    pub account: Vec<u64>,
    pub reject_text: String,
    pub session_params: BTreeMap<String, String>,
}

pub static LOGON_SCHEMA: Schema = Schema {
    name: "Logon",
    fields: &[
        FieldSpec::msg_type(),
        FieldSpec::int("heartBtInt", 108),
        FieldSpec::string("username", 553),
        FieldSpec::string("password", 554),
        FieldSpec::string("rawData", 96),
        FieldSpec::int("sendingTime", 52),
        FieldSpec::repeated("account", 1),
        FieldSpec::string("rejectText", 1328),
        FieldSpec::map("sessionParams", 9100),
    ],
};

impl WireMessage for Logon {
    const SCHEMA: &'static Schema = &LOGON_SCHEMA;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Heartbeat {
    pub msg_type: MsgType,
    pub test_req_id: String,
    pub transact_time: i64,
}

impl Heartbeat {
    pub fn new() -> Self {
        Self {
            msg_type: MsgType::Heartbeat,
            ..Default::default()
        }
    }
}

pub static HEARTBEAT_SCHEMA: Schema = Schema {
    name: "Heartbeat",
    fields: &[
        FieldSpec::msg_type(),
        FieldSpec::string("testReqId", 112),
        FieldSpec::int("transactTime", 60),
    ],
};

impl WireMessage for Heartbeat {
    const SCHEMA: &'static Schema = &HEARTBEAT_SCHEMA;
}

/// Session-level reject
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Reject {
    pub msg_type: MsgType,
    pub ref_seq_num: i64,
    pub ref_tag_id: i64,
    pub ref_msg_type: String,
    pub session_reject_reason: String,
    pub text: String,
    pub transact_time: i64,
}

pub static REJECT_SCHEMA: Schema = Schema {
    name: "Reject",
    fields: &[
        FieldSpec::msg_type(),
        FieldSpec::int("refSeqNum", 45),
        FieldSpec::int("refTagId", 371),
        FieldSpec::string("refMsgType", 372),
        FieldSpec::string("sessionRejectReason", 373),
        FieldSpec::string("text", 58),
        FieldSpec::int("transactTime", 60),
    ],
};

impl WireMessage for Reject {
    const SCHEMA: &'static Schema = &REJECT_SCHEMA;
}

/// Stop-loss / take-profit template attached to an order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Sltp {
    pub ord_type: Option<OrdType>,
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
}

pub static SLTP_SCHEMA: Schema = Schema {
    name: "SLTP",
    fields: &[
        FieldSpec::optional("ordType", 40),
        FieldSpec::optional("price", 44),
        FieldSpec::optional("stopPx", 99),
        FieldSpec::optional("capPrice", 1199),
        FieldSpec::optional("pegPriceType", 1094),
        FieldSpec::optional("pegOffsetType", 836),
        FieldSpec::optional("pegOffsetValue", 211),
    ],
};

impl WireMessage for Sltp {
    const SCHEMA: &'static Schema = &SLTP_SCHEMA;
}

/// Commission charged on a fill
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Commission {
    #[serde(with = "rust_decimal::serde::str_option")]
    pub amount: Option<Decimal>,
    pub comm_type: String,
    pub currency: String,
}

pub static COMMISSION_SCHEMA: Schema = Schema {
    name: "CommissionData",
    fields: &[
        FieldSpec::optional("amount", 12),
        FieldSpec::string("commType", 13),
        FieldSpec::string("currency", 479),
    ],
};

impl WireMessage for Commission {
    const SCHEMA: &'static Schema = &COMMISSION_SCHEMA;
}

/// One market-data entry (book level, trade, candle field)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MdEntry {
    pub md_update_action: Option<MdUpdateAction>,
    pub md_entry_type: Option<MdEntryType>,
    pub md_entry_id: String,
    pub symbol: String,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub md_entry_px: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub md_entry_size: Option<Decimal>,
    pub number_of_orders: i64,
    pub transact_time: i64,
    pub trade_id: String,
    pub aggressor_side: Option<Side>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub first_px: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub last_px: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub high_px: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub low_px: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub buy_volume: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub sell_volume: Option<Decimal>,
}

pub static MD_ENTRY_SCHEMA: Schema = Schema {
    name: "MDEntry",
    fields: &[
        FieldSpec::optional("mdUpdateAction", 279),
        FieldSpec::optional("mdEntryType", 269),
        FieldSpec::string("mdEntryId", 278),
        FieldSpec::string("symbol", 55),
        FieldSpec::optional("mdEntryPx", 270),
        FieldSpec::optional("mdEntrySize", 271),
        FieldSpec::int("numberOfOrders", 346),
        FieldSpec::int("transactTime", 60),
        FieldSpec::string("tradeId", 1003),
        FieldSpec::optional("aggressorSide", 1307),
        FieldSpec::optional("firstPx", 1025),
        FieldSpec::optional("lastPx", 31),
        FieldSpec::optional("highPx", 332),
        FieldSpec::optional("lowPx", 333),
        FieldSpec::optional("buyVolume", 330),
        FieldSpec::optional("sellVolume", 331),
    ],
};

impl WireMessage for MdEntry {
    const SCHEMA: &'static Schema = &MD_ENTRY_SCHEMA;
}

/// Per-currency balance line of an account status report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Balance {
    pub currency: String,
    pub last_update_time: i64,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub available: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub on_hold: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub settled: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub equity: Option<Decimal>,
}

pub static BALANCE_SCHEMA: Schema = Schema {
    name: "Balance",
    fields: &[
        FieldSpec::string("currency", 15),
        FieldSpec::int("lastUpdateTime", 779),
        FieldSpec::optional("available", 5001),
        FieldSpec::optional("onHold", 5002),
        FieldSpec::optional("settled", 5003),
        FieldSpec::optional("equity", 5004),
    ],
};

impl WireMessage for Balance {
    const SCHEMA: &'static Schema = &BALANCE_SCHEMA;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarginAmount {
    pub margin_amt_type: String,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub margin_amt: Option<Decimal>,
    pub margin_amt_ccy: String,
}

pub static MARGIN_AMOUNT_SCHEMA: Schema = Schema {
    name: "MarginAmount",
    fields: &[
        FieldSpec::string("marginAmtType", 1644),
        FieldSpec::optional("marginAmt", 1645),
        FieldSpec::string("marginAmtCcy", 1646),
    ],
};

impl WireMessage for MarginAmount {
    const SCHEMA: &'static Schema = &MARGIN_AMOUNT_SCHEMA;
}
