/*
[INPUT]:  Venue wire codes (FIX-style string codes)
[OUTPUT]: Typed Rust enums with serialization support
[POS]:    Data layer - enumerations shared by every message shape; unlisted codes kept as `Other`
[UPDATE]: When the venue adds message types or enum codes
*/

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::XenaError;

/// Message-type identifier carried under `msgType` / tag 35.
///
/// `Unknown` (code `""`) is reserved to mean "no type" and never resolves
/// to a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MsgType {
    #[default]
    Unknown,
    Heartbeat,
    Reject,
    ExecutionReport,
    OrderCancelReject,
    Logon,
    NewOrderSingle,
    NewOrderList,
    OrderCancelRequest,
    OrderCancelReplaceRequest,
    OrderStatusRequest,
    ListStatus,
    MarketDataRequest,
    MarketDataSnapshotFullRefresh,
    MarketDataIncrementalRefresh,
    MarketDataRequestReject,
    TradeCaptureReport,
    OrderMassStatusRequest,
    OrderMassStatusResponse,
    OrderMassCancelRequest,
    OrderMassCancelReport,
    PositionMaintenanceRequest,
    PositionMaintenanceReport,
    RequestForPositions,
    PositionReport,
    MassPositionReport,
    MarginRequirementReport,
    AccountStatusReportRequest,
    AccountStatusReport,
    AccountStatusUpdateReport,
}

impl MsgType {
    pub const ALL: [MsgType; 30] = [
        MsgType::Unknown,
        MsgType::Heartbeat,
        MsgType::Reject,
        MsgType::ExecutionReport,
        MsgType::OrderCancelReject,
        MsgType::Logon,
        MsgType::NewOrderSingle,
        MsgType::NewOrderList,
        MsgType::OrderCancelRequest,
        MsgType::OrderCancelReplaceRequest,
        MsgType::OrderStatusRequest,
        MsgType::ListStatus,
        MsgType::MarketDataRequest,
        MsgType::MarketDataSnapshotFullRefresh,
        MsgType::MarketDataIncrementalRefresh,
        MsgType::MarketDataRequestReject,
        MsgType::TradeCaptureReport,
        MsgType::OrderMassStatusRequest,
        MsgType::OrderMassStatusResponse,
        MsgType::OrderMassCancelRequest,
        MsgType::OrderMassCancelReport,
        MsgType::PositionMaintenanceRequest,
        MsgType::PositionMaintenanceReport,
        MsgType::RequestForPositions,
        MsgType::PositionReport,
        MsgType::MassPositionReport,
        MsgType::MarginRequirementReport,
        MsgType::AccountStatusReportRequest,
        MsgType::AccountStatusReport,
        MsgType::AccountStatusUpdateReport,
    ];

    /// Wire code for this message type
    pub fn as_code(self) -> &'static str {
        match self {
            MsgType::Unknown => "",
            MsgType::Heartbeat => "0",
            MsgType::Reject => "3",
            MsgType::ExecutionReport => "8",
            MsgType::OrderCancelReject => "9",
            MsgType::Logon => "A",
            MsgType::NewOrderSingle => "D",
            MsgType::NewOrderList => "E",
            MsgType::OrderCancelRequest => "F",
            MsgType::OrderCancelReplaceRequest => "G",
            MsgType::OrderStatusRequest => "H",
            MsgType::ListStatus => "N",
            MsgType::MarketDataRequest => "V",
            MsgType::MarketDataSnapshotFullRefresh => "W",
            MsgType::MarketDataIncrementalRefresh => "X",
            MsgType::MarketDataRequestReject => "Y",
            MsgType::TradeCaptureReport => "AE",
            MsgType::OrderMassStatusRequest => "AF",
            MsgType::OrderMassStatusResponse => "U8",
            MsgType::OrderMassCancelRequest => "q",
            MsgType::OrderMassCancelReport => "r",
            MsgType::PositionMaintenanceRequest => "AL",
            MsgType::PositionMaintenanceReport => "AM",
            MsgType::RequestForPositions => "AN",
            MsgType::PositionReport => "AP",
            MsgType::MassPositionReport => "MAP",
            MsgType::MarginRequirementReport => "CJ",
            MsgType::AccountStatusReportRequest => "XAA",
            MsgType::AccountStatusReport => "XAR",
            MsgType::AccountStatusUpdateReport => "XAF",
        }
    }

    /// Look up a message type by wire code
    pub fn from_code(code: &str) -> Option<MsgType> {
        MsgType::ALL
            .iter()
            .copied()
            .find(|msg_type| msg_type.as_code() == code)
    }
}

impl fmt::Display for MsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

impl FromStr for MsgType {
    type Err = XenaError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        MsgType::from_code(code).ok_or_else(|| XenaError::UnknownMessageType(code.to_string()))
    }
}

impl Serialize for MsgType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_code())
    }
}

impl<'de> Deserialize<'de> for MsgType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        MsgType::from_code(&code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown MsgType \"{code}\"")))
    }
}

/// Accepts a wire code sent either as a string or as a bare integer
struct CodeVisitor;

impl<'de> Visitor<'de> for CodeVisitor {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a wire code")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<String, E> {
        Ok(value.to_string())
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<String, E> {
        Ok(value)
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<String, E> {
        Ok(value.to_string())
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<String, E> {
        Ok(value.to_string())
    }
}

/// Venue enum keyed by wire code. Codes missing from the list decode into
/// `Other` and encode back unchanged.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident = $code:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
            Other(String),
        }

        impl $name {
            pub fn as_code(&self) -> &str {
                match self {
                    $($name::$variant => $code,)+
                    $name::Other(code) => code.as_str(),
                }
            }

            pub fn from_code(code: &str) -> Self {
                match code {
                    $($code => $name::$variant,)+
                    other => $name::Other(other.to_string()),
                }
            }

            pub fn is_known(&self) -> bool {
                !matches!(self, $name::Other(_))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_code())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_code())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                deserializer
                    .deserialize_any(CodeVisitor)
                    .map(|code| $name::from_code(&code))
            }
        }
    };
}

wire_enum!(Side {
    Buy = "1",
    Sell = "2",
});

wire_enum!(OrdType {
    Market = "1",
    Limit = "2",
    Stop = "3",
    StopLimit = "4",
    MarketIfTouched = "J",
    Pegged = "P",
});

wire_enum!(TimeInForce {
    Day = "0",
    GoodTillCancel = "1",
    ImmediateOrCancel = "3",
    FillOrKill = "4",
});

wire_enum!(ExecType {
    New = "0",
    Canceled = "4",
    Replaced = "5",
    PendingCancel = "6",
    Rejected = "8",
    Suspended = "9",
    PendingNew = "A",
    Expired = "C",
    Restated = "D",
    PendingReplace = "E",
    Trade = "F",
    OrderStatus = "I",
});

wire_enum!(OrdStatus {
    New = "0",
    PartiallyFilled = "1",
    Filled = "2",
    Canceled = "4",
    PendingCancel = "6",
    Stopped = "7",
    Rejected = "8",
    Suspended = "9",
    PendingNew = "A",
    Expired = "C",
    PendingReplace = "E",
});

wire_enum!(PositionEffect {
    Open = "O",
    Close = "C",
});

wire_enum!(PegPriceType {
    LastPeg = "1",
    MidPricePeg = "2",
    OpeningPeg = "3",
    MarketPeg = "4",
    PrimaryPeg = "5",
    TrailingStopPeg = "8",
});

wire_enum!(PegOffsetType {
    Price = "0",
    BasisPoints = "1",
    Ticks = "2",
});

wire_enum!(SubscriptionRequestType {
    Snapshot = "0",
    SnapshotAndUpdates = "1",
    DisablePreviousSnapshot = "2",
});

wire_enum!(ThrottleType {
    InboundRate = "0",
    OutstandingRequests = "1",
});

wire_enum!(ThrottleTimeUnit {
    Seconds = "0",
    TenthsOfASecond = "1",
    HundredthsOfASecond = "2",
    Milliseconds = "3",
    Microseconds = "4",
    Nanoseconds = "5",
    Minutes = "10",
    Hours = "11",
});

wire_enum!(MdUpdateAction {
    New = "0",
    Change = "1",
    Delete = "2",
});

wire_enum!(MdEntryType {
    Bid = "0",
    Offer = "1",
    Trade = "2",
    OpeningPrice = "4",
    ClosingPrice = "5",
    TradingSessionHighPrice = "7",
    TradingSessionLowPrice = "8",
    TradeVolume = "B",
});

wire_enum!(PosTransType {
    Exercise = "1",
    DoNotExercise = "2",
    PositionAdjustment = "3",
    PositionChangeSubmission = "4",
    Pledge = "5",
    Collapse = "20",
});

wire_enum!(PosMaintAction {
    New = "1",
    Replace = "2",
    Cancel = "3",
});

wire_enum!(
    /// Scope of an `OrderMassCancelRequest`
    MassCancelRequestType {
        CancelOrdersForASecurity = "1",
        CancelAllOrders = "7",
    }
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_msg_type_codes_are_unique() {
        for (i, a) in MsgType::ALL.iter().enumerate() {
            for b in &MsgType::ALL[i + 1..] {
                assert_ne!(a.as_code(), b.as_code(), "{a:?} and {b:?} share a code");
            }
        }
    }

    #[test]
    fn test_msg_type_from_code() {
        assert_eq!(MsgType::from_code("8"), Some(MsgType::ExecutionReport));
        assert_eq!(MsgType::from_code("MAP"), Some(MsgType::MassPositionReport));
        assert_eq!(MsgType::from_code("ZZ"), None);
        assert!("ZZ".parse::<MsgType>().is_err());
    }

    #[test]
    fn test_msg_type_serde_uses_code() {
        let json = serde_json::to_string(&MsgType::Logon).unwrap();
        assert_eq!(json, "\"A\"");
        let parsed: MsgType = serde_json::from_str("\"W\"").unwrap();
        assert_eq!(parsed, MsgType::MarketDataSnapshotFullRefresh);
        assert!(serde_json::from_str::<MsgType>("\"nope\"").is_err());
    }

    #[test]
    fn test_side_codes() {
        assert_eq!(serde_json::to_string(&Side::Buy).unwrap(), "\"1\"");
        assert_eq!(serde_json::to_string(&Side::Sell).unwrap(), "\"2\"");
    }

    #[test]
    fn test_unlisted_code_kept_as_other() {
        let status: OrdStatus = serde_json::from_str("\"3\"").unwrap();
        assert_eq!(status, OrdStatus::Other("3".to_string()));
        assert!(!status.is_known());
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"3\"");
        assert_eq!(status.to_string(), "3");
    }

    #[test]
    fn test_integer_code_accepted() {
        let unit: ThrottleTimeUnit = serde_json::from_str("10").unwrap();
        assert_eq!(unit, ThrottleTimeUnit::Minutes);
        assert_eq!(TimeInForce::from_code("6"), TimeInForce::Other("6".to_string()));
        assert!(MdEntryType::from_code("B").is_known());
    }
}
