/*
[INPUT]:  Closed MsgType enumeration and typed message shapes
[OUTPUT]: Message sum type plus total MsgType -> shape mapping
[POS]:    Registry layer - resolves wire type codes for the codec
[UPDATE]: When a message type or shape is added to the protocol
*/

use serde_json::{Map, Value};

use crate::codec::{self, KeyMode, Schema, WireMessage};
use crate::error::{Result, XenaError};
use crate::types::*;

macro_rules! message_shapes {
    ($($variant:ident($shape:ty)),+ $(,)?) => {
        /// Any decoded or outbound protocol message
        #[derive(Debug, Clone, PartialEq)]
        pub enum Message {
            $($variant($shape)),+
        }

        impl Message {
            /// Type code carried by the message itself
            pub fn msg_type(&self) -> MsgType {
                match self {
                    $(Message::$variant(inner) => inner.msg_type),+
                }
            }

            pub fn schema(&self) -> &'static Schema {
                match self {
                    $(Message::$variant(_) => <$shape as WireMessage>::SCHEMA),+
                }
            }

            pub fn encode(&self, mode: KeyMode) -> Result<String> {
                match self {
                    $(Message::$variant(inner) => codec::encode(inner, mode)),+
                }
            }

            pub fn to_wire_value(&self, mode: KeyMode) -> Result<Value> {
                match self {
                    $(Message::$variant(inner) => codec::to_wire_value(inner, mode)),+
                }
            }
        }

        $(
            impl From<$shape> for Message {
                fn from(inner: $shape) -> Self {
                    Message::$variant(inner)
                }
            }
        )+
    };
}

message_shapes! {
    Logon(Logon),
    Heartbeat(Heartbeat),
    Reject(Reject),
    NewOrderSingle(NewOrderSingle),
    NewOrderList(NewOrderList),
    OrderCancelRequest(OrderCancelRequest),
    OrderCancelReplaceRequest(OrderCancelReplaceRequest),
    OrderStatusRequest(OrderStatusRequest),
    OrderMassCancelRequest(OrderMassCancelRequest),
    MarketDataRequest(MarketDataRequest),
    AccountStatusReportRequest(AccountStatusReportRequest),
    PositionsRequest(PositionsRequest),
    PositionMaintenanceRequest(PositionMaintenanceRequest),
    ExecutionReport(ExecutionReport),
    OrderCancelReject(OrderCancelReject),
    ListStatus(ListStatus),
    OrderMassStatusResponse(OrderMassStatusResponse),
    OrderMassCancelReport(OrderMassCancelReport),
    MarketDataRefresh(MarketDataRefresh),
    MarketDataRequestReject(MarketDataRequestReject),
    BalanceIncrementalRefresh(BalanceIncrementalRefresh),
    PositionReport(PositionReport),
    MassPositionReport(MassPositionReport),
    PositionMaintenanceReport(PositionMaintenanceReport),
    MarginRequirementReport(MarginRequirementReport),
}

impl Message {
    /// Stream id of market-data refreshes and rejects
    pub fn md_stream_id(&self) -> Option<&str> {
        match self {
            Message::MarketDataRefresh(refresh) => Some(&refresh.md_stream_id),
            Message::MarketDataRequestReject(reject) => Some(&reject.md_stream_id),
            _ => None,
        }
    }
}

impl MsgType {
    /// Shape decoded for this type; `None` only for the reserved `Unknown`
    pub fn schema(self) -> Option<&'static Schema> {
        let schema = match self {
            MsgType::Unknown => return None,
            MsgType::Heartbeat => &HEARTBEAT_SCHEMA,
            MsgType::Reject => &REJECT_SCHEMA,
            MsgType::ExecutionReport => &EXECUTION_REPORT_SCHEMA,
            MsgType::OrderCancelReject => &ORDER_CANCEL_REJECT_SCHEMA,
            MsgType::Logon => &LOGON_SCHEMA,
            MsgType::NewOrderSingle => &NEW_ORDER_SINGLE_SCHEMA,
            MsgType::NewOrderList => &NEW_ORDER_LIST_SCHEMA,
            MsgType::OrderCancelRequest => &ORDER_CANCEL_REQUEST_SCHEMA,
            MsgType::OrderCancelReplaceRequest => &ORDER_CANCEL_REPLACE_REQUEST_SCHEMA,
            MsgType::OrderStatusRequest | MsgType::OrderMassStatusRequest => {
                &ORDER_STATUS_REQUEST_SCHEMA
            }
            MsgType::ListStatus => &LIST_STATUS_SCHEMA,
            MsgType::MarketDataRequest => &MARKET_DATA_REQUEST_SCHEMA,
            MsgType::MarketDataSnapshotFullRefresh
            | MsgType::MarketDataIncrementalRefresh
            | MsgType::TradeCaptureReport => &MARKET_DATA_REFRESH_SCHEMA,
            MsgType::MarketDataRequestReject => &MARKET_DATA_REQUEST_REJECT_SCHEMA,
            MsgType::OrderMassStatusResponse => &ORDER_MASS_STATUS_RESPONSE_SCHEMA,
            MsgType::OrderMassCancelRequest => &ORDER_MASS_CANCEL_REQUEST_SCHEMA,
            MsgType::OrderMassCancelReport => &ORDER_MASS_CANCEL_REPORT_SCHEMA,
            MsgType::PositionMaintenanceRequest => &POSITION_MAINTENANCE_REQUEST_SCHEMA,
            MsgType::PositionMaintenanceReport => &POSITION_MAINTENANCE_REPORT_SCHEMA,
            MsgType::RequestForPositions => &POSITIONS_REQUEST_SCHEMA,
            MsgType::PositionReport => &POSITION_REPORT_SCHEMA,
            MsgType::MassPositionReport => &MASS_POSITION_REPORT_SCHEMA,
            MsgType::MarginRequirementReport => &MARGIN_REQUIREMENT_REPORT_SCHEMA,
            MsgType::AccountStatusReportRequest => &ACCOUNT_STATUS_REPORT_REQUEST_SCHEMA,
            MsgType::AccountStatusReport | MsgType::AccountStatusUpdateReport => {
                &BALANCE_INCREMENTAL_REFRESH_SCHEMA
            }
        };
        Some(schema)
    }
}

fn shape<T: WireMessage>(fields: Map<String, Value>) -> Result<T> {
    codec::from_fields(T::SCHEMA, fields)
}

/// Build the typed message for `msg_type` from readable-keyed fields
pub fn instantiate(msg_type: MsgType, fields: Map<String, Value>) -> Result<Message> {
    let message = match msg_type {
        MsgType::Unknown => return Err(XenaError::UnknownMessageType(String::new())),
        MsgType::Heartbeat => Message::Heartbeat(shape(fields)?),
        MsgType::Reject => Message::Reject(shape(fields)?),
        MsgType::ExecutionReport => Message::ExecutionReport(shape(fields)?),
        MsgType::OrderCancelReject => Message::OrderCancelReject(shape(fields)?),
        MsgType::Logon => Message::Logon(shape(fields)?),
        MsgType::NewOrderSingle => Message::NewOrderSingle(shape(fields)?),
        MsgType::NewOrderList => Message::NewOrderList(shape(fields)?),
        MsgType::OrderCancelRequest => Message::OrderCancelRequest(shape(fields)?),
        MsgType::OrderCancelReplaceRequest => Message::OrderCancelReplaceRequest(shape(fields)?),
        MsgType::OrderStatusRequest | MsgType::OrderMassStatusRequest => {
            Message::OrderStatusRequest(shape(fields)?)
        }
        MsgType::ListStatus => Message::ListStatus(shape(fields)?),
        MsgType::MarketDataRequest => Message::MarketDataRequest(shape(fields)?),
        MsgType::MarketDataSnapshotFullRefresh
        | MsgType::MarketDataIncrementalRefresh
        | MsgType::TradeCaptureReport => Message::MarketDataRefresh(shape(fields)?),
        MsgType::MarketDataRequestReject => Message::MarketDataRequestReject(shape(fields)?),
        MsgType::OrderMassStatusResponse => Message::OrderMassStatusResponse(shape(fields)?),
        MsgType::OrderMassCancelRequest => Message::OrderMassCancelRequest(shape(fields)?),
        MsgType::OrderMassCancelReport => Message::OrderMassCancelReport(shape(fields)?),
        MsgType::PositionMaintenanceRequest => {
            Message::PositionMaintenanceRequest(shape(fields)?)
        }
        MsgType::PositionMaintenanceReport => Message::PositionMaintenanceReport(shape(fields)?),
        MsgType::RequestForPositions => Message::PositionsRequest(shape(fields)?),
        MsgType::PositionReport => Message::PositionReport(shape(fields)?),
        MsgType::MassPositionReport => Message::MassPositionReport(shape(fields)?),
        MsgType::MarginRequirementReport => Message::MarginRequirementReport(shape(fields)?),
        MsgType::AccountStatusReportRequest => {
            Message::AccountStatusReportRequest(shape(fields)?)
        }
        MsgType::AccountStatusReport | MsgType::AccountStatusUpdateReport => {
            Message::BalanceIncrementalRefresh(shape(fields)?)
        }
    };
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// Serde's field names for the default value must match the schema table
    fn assert_schema_matches<T: WireMessage>() {
        let value = serde_json::to_value(T::default()).unwrap();
        let mut serde_keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        let mut schema_keys: Vec<&str> = T::SCHEMA.fields.iter().map(|field| field.name).collect();
        serde_keys.sort_unstable();
        schema_keys.sort_unstable();
        assert_eq!(serde_keys, schema_keys, "schema {}", T::SCHEMA.name);
    }

    #[test]
    fn test_every_shape_matches_its_struct() {
        assert_schema_matches::<Logon>();
        assert_schema_matches::<Heartbeat>();
        assert_schema_matches::<Reject>();
        assert_schema_matches::<Sltp>();
        assert_schema_matches::<Commission>();
        assert_schema_matches::<MdEntry>();
        assert_schema_matches::<Balance>();
        assert_schema_matches::<MarginAmount>();
        assert_schema_matches::<NewOrderSingle>();
        assert_schema_matches::<NewOrderList>();
        assert_schema_matches::<OrderCancelRequest>();
        assert_schema_matches::<OrderCancelReplaceRequest>();
        assert_schema_matches::<OrderStatusRequest>();
        assert_schema_matches::<OrderMassCancelRequest>();
        assert_schema_matches::<MarketDataRequest>();
        assert_schema_matches::<AccountStatusReportRequest>();
        assert_schema_matches::<PositionsRequest>();
        assert_schema_matches::<PositionMaintenanceRequest>();
        assert_schema_matches::<ExecutionReport>();
        assert_schema_matches::<OrderCancelReject>();
        assert_schema_matches::<ListStatus>();
        assert_schema_matches::<OrderMassStatusResponse>();
        assert_schema_matches::<OrderMassCancelReport>();
        assert_schema_matches::<MarketDataRefresh>();
        assert_schema_matches::<MarketDataRequestReject>();
        assert_schema_matches::<BalanceIncrementalRefresh>();
        assert_schema_matches::<PositionReport>();
        assert_schema_matches::<MassPositionReport>();
        assert_schema_matches::<PositionMaintenanceReport>();
        assert_schema_matches::<MarginRequirementReport>();
    }

    #[test]
    fn test_names_and_tags_unique_per_schema() {
        for msg_type in MsgType::ALL {
            let Some(schema) = msg_type.schema() else {
                continue;
            };
            let names: HashSet<_> = schema.fields.iter().map(|field| field.name).collect();
            let tags: HashSet<_> = schema.fields.iter().map(|field| field.tag).collect();
            assert_eq!(names.len(), schema.fields.len(), "names in {}", schema.name);
            assert_eq!(tags.len(), schema.fields.len(), "tags in {}", schema.name);
        }
    }

    #[test]
    fn test_every_type_but_unknown_resolves() {
        for msg_type in MsgType::ALL {
            if msg_type == MsgType::Unknown {
                assert!(msg_type.schema().is_none());
                continue;
            }
            assert!(msg_type.schema().is_some(), "no schema for {msg_type:?}");

            let mut fields = Map::new();
            fields.insert("msgType".to_string(), Value::String(msg_type.as_code().to_string()));
            let message = instantiate(msg_type, fields).unwrap();
            assert_eq!(message.msg_type(), msg_type);
            assert_eq!(Some(message.schema().name), msg_type.schema().map(|s| s.name));
        }
    }

    #[test]
    fn test_unknown_does_not_instantiate() {
        let err = instantiate(MsgType::Unknown, Map::new()).unwrap_err();
        assert!(matches!(err, XenaError::UnknownMessageType(code) if code.is_empty()));
    }

    #[test]
    fn test_md_stream_id() {
        let refresh = Message::from(MarketDataRefresh {
            md_stream_id: "trades:XBTUSD".to_string(),
            ..Default::default()
        });
        assert_eq!(refresh.md_stream_id(), Some("trades:XBTUSD"));
        assert_eq!(Message::from(Heartbeat::new()).md_stream_id(), None);
    }
}
