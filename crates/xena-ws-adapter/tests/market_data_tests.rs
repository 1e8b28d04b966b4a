/*
[INPUT]:  Mock market-data venue and subscription scenarios
[OUTPUT]: Test results for stream-keyed subscriptions
[POS]:    Integration tests - market-data session
[UPDATE]: When subscription or dispatch rules change
*/

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{MockVenue, eventually};
use rstest::rstest;
use tokio::sync::mpsc;
use tokio_test::{assert_err, assert_ok};
use xena_ws_adapter::{
    MarketDataRequest, MarketDataSession, Message, MsgType, SubscribeOptions,
    SubscriptionRequestType, ThrottleTimeUnit, ThrottleType, XenaError, decode_as,
};

fn forward(tx: mpsc::UnboundedSender<Message>) -> impl Fn(Message) -> std::future::Ready<()> + Send + Sync {
    move |message: Message| {
        let _ = tx.send(message);
        std::future::ready(())
    }
}

async fn recv(rx: &mut mpsc::UnboundedReceiver<Message>) -> Message {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for market data")
        .expect("listener dropped")
}

#[tokio::test]
async fn test_candles_snapshot_delivered_once() {
    let venue = MockVenue::market_data().await;
    let session = MarketDataSession::new(venue.config());
    let (tx, mut rx) = mpsc::unbounded_channel();

    let stream_id = assert_ok!(
        session
            .candles("XBTUSD", "1m", forward(tx), SubscribeOptions::candles())
            .await
    );
    assert_eq!(stream_id, "candles:XBTUSD:1m");
    assert!(session.is_subscribed(&stream_id));

    let request: MarketDataRequest = assert_ok!(decode_as(&venue.next_frame().await));
    assert_eq!(request.md_stream_id, "candles:XBTUSD:1m");
    assert_eq!(
        request.subscription_request_type,
        Some(SubscriptionRequestType::SnapshotAndUpdates)
    );
    assert_eq!(request.throttle_type, Some(ThrottleType::OutstandingRequests));
    assert_eq!(request.throttle_time_interval, 250);
    assert_eq!(request.throttle_time_unit, Some(ThrottleTimeUnit::Milliseconds));

    venue.send("not json");
    venue.send(r#"{"35":"W","1500":"candles:ETHUSD:1m","55":"ETHUSD"}"#);
    venue.send(r#"{"35":"8","11":"stray"}"#);
    venue.send(r#"{"35":"W","1500":"candles:XBTUSD:1m","55":"XBTUSD","268":[{"269":"0"}]}"#);

    let message = recv(&mut rx).await;
    assert_eq!(message.msg_type(), MsgType::MarketDataSnapshotFullRefresh);
    let Message::MarketDataRefresh(refresh) = message else {
        panic!("expected a refresh");
    };
    assert_eq!(refresh.symbol, "XBTUSD");
    assert_eq!(refresh.md_entry.len(), 1);
    assert!(rx.try_recv().is_err());
    session.close().await;
}

#[tokio::test]
async fn test_incremental_and_reject_routed_by_stream() {
    let venue = MockVenue::market_data().await;
    let session = MarketDataSession::new(venue.config());
    let (tx, mut rx) = mpsc::unbounded_channel();

    let stream_id = assert_ok!(
        session
            .dom("XBTUSD", forward(tx), SubscribeOptions::default().depth(10))
            .await
    );
    let request: MarketDataRequest = assert_ok!(decode_as(&venue.next_frame().await));
    assert_eq!(request.market_depth, 10);
    assert_eq!(request.throttle_time_interval, 500);

    venue.send(&format!(r#"{{"35":"X","1500":"{stream_id}"}}"#));
    venue.send(&format!(r#"{{"35":"Y","1500":"{stream_id}","58":"no such symbol"}}"#));

    assert_eq!(recv(&mut rx).await.msg_type(), MsgType::MarketDataIncrementalRefresh);
    assert_eq!(recv(&mut rx).await.msg_type(), MsgType::MarketDataRequestReject);
    session.close().await;
}

#[tokio::test]
async fn test_duplicate_subscription() {
    let venue = MockVenue::market_data().await;
    let session = MarketDataSession::new(venue.config());
    let noop = |_message: Message| async move {};

    assert_ok!(session.trades("XBTUSD", noop, SubscribeOptions::default()).await);
    let _request = venue.next_frame().await;

    let err = assert_err!(session.trades("XBTUSD", noop, SubscribeOptions::default()).await);
    assert!(matches!(err, XenaError::DuplicateSubscription(ref id) if id == "trades:XBTUSD"));
    assert!(err.is_usage_error());
    assert!(venue.frame_within(Duration::from_millis(200)).await.is_none());
    session.close().await;
}

#[tokio::test]
async fn test_unsubscribe() {
    let venue = MockVenue::market_data().await;
    let session = MarketDataSession::new(venue.config());
    let noop = |_message: Message| async move {};

    let stream_id = assert_ok!(session.market_watch(noop, SubscribeOptions::default()).await);
    let _request = venue.next_frame().await;

    assert_ok!(session.unsubscribe(&stream_id).await);
    let request: MarketDataRequest = assert_ok!(decode_as(&venue.next_frame().await));
    assert_eq!(request.md_stream_id, "market-watch");
    assert_eq!(
        request.subscription_request_type,
        Some(SubscriptionRequestType::DisablePreviousSnapshot)
    );
    assert!(!session.is_subscribed(&stream_id));

    let err = assert_err!(session.unsubscribe(&stream_id).await);
    assert!(matches!(err, XenaError::NoSuchSubscription(_)));

    // re-subscribing after removal is allowed
    assert_ok!(session.market_watch(noop, SubscribeOptions::default()).await);
    session.close().await;
}

#[rstest]
#[case("", "1m")]
#[case("XBTUSD", "")]
#[tokio::test]
async fn test_candles_rejects_empty_arguments(#[case] symbol: &str, #[case] timeframe: &str) {
    let session = MarketDataSession::new(xena_ws_adapter::ConnectionConfig::new("ws://127.0.0.1:1"));
    let noop = |_message: Message| async move {};
    let err = assert_err!(
        session
            .candles(symbol, timeframe, noop, SubscribeOptions::candles())
            .await
    );
    assert!(matches!(err, XenaError::InvalidArgument(_)));
    assert!(session.subscriptions().is_empty());
}

#[tokio::test]
async fn test_connection_loss_clears_subscriptions() {
    let venue = MockVenue::market_data().await;
    let session = MarketDataSession::new(venue.config());
    let noop = |_message: Message| async move {};
    let (tx, mut rx) = mpsc::unbounded_channel();

    let observer = session.clone();
    session.on_connection_lost(move |err: Arc<XenaError>| {
        let observer = observer.clone();
        let tx = tx.clone();
        async move {
            let _ = tx.send((observer.subscriptions().len(), err.is_retryable()));
            Ok::<(), XenaError>(())
        }
    });

    assert_ok!(session.candles("XBTUSD", "5m", noop, SubscribeOptions::candles()).await);
    assert_ok!(session.dom("XBTUSD", noop, SubscribeOptions::default()).await);
    assert_eq!(session.subscriptions().len(), 2);

    venue.drop_connection();
    let (remaining, retryable) = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("loss callback not invoked")
        .expect("callback dropped");
    assert_eq!(remaining, 0);
    assert!(retryable);
    assert!(eventually(|| session.subscriptions().is_empty()).await);
    let err = assert_err!(session.unsubscribe("candles:XBTUSD:5m").await);
    assert!(matches!(err, XenaError::NoSuchSubscription(id) if id == "candles:XBTUSD:5m"));

    // a fresh subscription reconnects on demand
    assert_ok!(session.candles("XBTUSD", "5m", noop, SubscribeOptions::candles()).await);
    assert_eq!(venue.connections(), 2);
    session.close().await;
}
