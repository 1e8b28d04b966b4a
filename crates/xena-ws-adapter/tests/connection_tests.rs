/*
[INPUT]:  Mock venue scripted per scenario
[OUTPUT]: Test results for the connection lifecycle
[POS]:    Integration tests - handshake, keepalive, close and loss handling
[UPDATE]: When connection semantics change
*/

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use common::{HEARTBEAT, MockVenue, eventually, logon_builder};
use tokio::sync::mpsc;
use tokio_test::{assert_err, assert_ok};
use xena_ws_adapter::{
    ConnectionState, Logon, MarketDataSession, TradingSession, XenaError, decode_as,
};

#[tokio::test]
async fn test_trading_login_sends_signed_logon_first() {
    let venue = MockVenue::trading().await;
    let session = TradingSession::new(venue.config(), logon_builder());

    let ack = assert_ok!(session.connect().await);
    assert_eq!(ack.heart_bt_int, 15);
    assert_eq!(ack.account, vec![7]);
    assert_eq!(session.state(), ConnectionState::Authenticated);

    let logon: Logon = assert_ok!(decode_as(&venue.next_raw_frame().await));
    assert_eq!(logon.username, "test-key");
    assert_eq!(logon.password, "test-signature");
    assert!(logon.raw_data.starts_with("AUTH"));
    assert_eq!(logon.raw_data, format!("AUTH{}", logon.sending_time));
    assert_eq!(logon.account, vec![7]);

    // already connected: the stored ack comes back without a new handshake
    let again = assert_ok!(session.connect().await);
    assert_eq!(again, ack);
    assert_eq!(venue.connections(), 1);
    session.close().await;
}

#[tokio::test]
async fn test_login_rejected() {
    let venue = MockVenue::start(true, r#"{"35":"A","1328":"invalid signature"}"#).await;
    let session = TradingSession::new(venue.config(), logon_builder());

    let err = assert_err!(session.connect().await);
    assert!(matches!(err, XenaError::LoginFailed(ref text) if text == "invalid signature"));
    assert_eq!(session.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_login_unexpected_reply_type() {
    let venue = MockVenue::start(false, HEARTBEAT).await;
    let session = MarketDataSession::new(venue.config());

    let err = assert_err!(session.connect().await);
    match err {
        XenaError::LoginFailed(text) => assert!(text.contains("unexpected message type")),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_unreachable_endpoint() {
    let session = MarketDataSession::new(xena_ws_adapter::ConnectionConfig::new("ws://127.0.0.1:1"));
    let err = assert_err!(session.connect().await);
    assert!(err.is_retryable());
    assert_eq!(session.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_heartbeat_uses_server_interval() {
    let venue = MockVenue::start(false, r#"{"35":"A","108":1}"#).await;
    let session = MarketDataSession::new(venue.config());
    assert_ok!(session.connect().await);

    let started = tokio::time::Instant::now();
    assert_eq!(venue.next_raw_frame().await, HEARTBEAT);
    assert_eq!(venue.next_raw_frame().await, HEARTBEAT);
    assert!(started.elapsed() >= Duration::from_millis(900));
    session.close().await;
}

#[tokio::test]
async fn test_close_suppresses_loss_callbacks() {
    let venue = MockVenue::market_data().await;
    let session = MarketDataSession::new(venue.config());
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    session.on_connection_lost(move |_err: Arc<XenaError>| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<(), XenaError>(())
        }
    });

    assert_ok!(session.connect().await);
    session.close().await;
    session.close().await;
    assert_eq!(session.state(), ConnectionState::Disconnected);

    venue.drop_connection();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_loss_callbacks_run_in_order() {
    let venue = MockVenue::market_data().await;
    let session = MarketDataSession::new(venue.config());
    let (tx, mut rx) = mpsc::unbounded_channel();

    for index in 1..=3 {
        let tx = tx.clone();
        session.on_connection_lost(move |_err: Arc<XenaError>| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(index);
                if index == 2 {
                    return Err(XenaError::NotConnected);
                }
                Ok(())
            }
        });
    }

    assert_ok!(session.connect().await);
    venue.drop_connection();

    let mut order = Vec::new();
    for _ in 0..3 {
        let index = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("loss callback not invoked");
        order.extend(index);
    }
    assert_eq!(order, vec![1, 2, 3]);
    assert_eq!(session.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_send_after_close_is_dropped() {
    let venue = MockVenue::trading().await;
    let session = TradingSession::new(venue.config(), logon_builder());
    assert_ok!(session.connect().await);
    let _logon = venue.next_raw_frame().await;
    session.close().await;

    assert_ok!(session.heartbeat().await);
    assert_ok!(session.positions(7).await);
    assert!(venue.frame_within(Duration::from_millis(200)).await.is_none());
    assert_eq!(venue.connections(), 1);
    assert_eq!(session.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_connect_after_loss_opens_new_channel() {
    let venue = MockVenue::market_data().await;
    let session = MarketDataSession::new(venue.config());
    assert_ok!(session.connect().await);

    venue.drop_connection();
    assert!(eventually(|| session.state() == ConnectionState::Disconnected).await);

    assert_ok!(session.connect().await);
    assert_eq!(venue.connections(), 2);
    assert_eq!(session.state(), ConnectionState::Authenticated);
    session.close().await;
}

#[tokio::test]
async fn test_connect_after_close_reopens() {
    let venue = MockVenue::market_data().await;
    let session = MarketDataSession::new(venue.config());
    assert_ok!(session.connect().await);
    session.close().await;

    assert_ok!(session.connect().await);
    assert_eq!(venue.connections(), 2);
    assert!(session.connection().is_connected());
    session.close().await;
}
