/*
[INPUT]:  Endpoint configuration, consumer callbacks and outbound commands
[OUTPUT]: Market-data and trading sessions over a shared channel lifecycle
[POS]:    WebSocket layer - real-time streams and command channel
[UPDATE]: When adding sessions or changing frame dispatch
*/

pub mod connection;
pub mod listener;
mod log;
pub mod market_data;
pub mod trading;

pub use connection::{Connection, ConnectionState, FrameHandler, LogonProducer};
pub use listener::{ConnectionLostHandler, Listener};
pub use market_data::{
    MARKET_WATCH_STREAM, MarketDataSession, SubscribeOptions, candles_stream_id, dom_stream_id,
    trades_stream_id,
};
pub use trading::TradingSession;

use tracing::debug;

use crate::codec::Decoded;
use crate::registry::Message;

/// Batches in arrival order; untyped payloads have no consumer and are dropped
pub(crate) fn flatten(decoded: Decoded) -> Vec<Message> {
    let mut out = Vec::new();
    let mut pending = vec![decoded];
    while let Some(next) = pending.pop() {
        match next {
            Decoded::Message(message) => out.push(message),
            Decoded::Batch(items) => pending.extend(items.into_iter().rev()),
            Decoded::Untyped(value) => debug!(payload = %value, "untyped ws payload dropped"),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use crate::types::MsgType;

    #[test]
    fn test_flatten_keeps_batch_order() {
        let decoded = codec::decode(r#"[{"35":"0"},{"x":1},[{"35":"8"},{"35":"A"}]]"#).unwrap();
        let types: Vec<MsgType> = flatten(decoded).iter().map(Message::msg_type).collect();
        assert_eq!(
            types,
            vec![MsgType::Heartbeat, MsgType::ExecutionReport, MsgType::Logon]
        );
    }
}
