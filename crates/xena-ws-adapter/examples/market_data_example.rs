/*
[INPUT]:  Public market-data endpoint
[OUTPUT]: Candle and order book refreshes printed to stdout
[POS]:    Examples - market-data subscriptions
[UPDATE]: When the market-data session API changes
*/

use tokio::time::{Duration, sleep};
use xena_ws_adapter::*;

/// Example: candles and DOM for XBTUSD for thirty seconds
#[tokio::main]
async fn main() -> Result<()> {
    println!("=== Xena Market Data Example ===\n");

    let session = MarketDataSession::new(ConnectionConfig::market_data());
    let ack = session.connect().await?;
    println!("✓ Connected (heartbeat {}s)", ack.heart_bt_int);

    session.on_connection_lost(|err: std::sync::Arc<XenaError>| async move {
        println!("✗ Connection lost: {err}");
        Ok::<(), XenaError>(())
    });

    let candles = session
        .candles(
            "XBTUSD",
            "1m",
            |message: Message| async move {
                if let Message::MarketDataRefresh(refresh) = message {
                    println!("candles {} entries={}", refresh.symbol, refresh.md_entry.len());
                }
            },
            SubscribeOptions::candles(),
        )
        .await?;
    println!("✓ Subscribed {candles}");

    let dom = session
        .dom(
            "XBTUSD",
            |message: Message| async move {
                println!("dom {} ({})", message.msg_type(), message.md_stream_id().unwrap_or(""));
            },
            SubscribeOptions::default().depth(10),
        )
        .await?;
    println!("✓ Subscribed {dom}\n");

    sleep(Duration::from_secs(30)).await;

    session.unsubscribe(&dom).await?;
    session.close().await;
    println!("\n✓ Market data example complete");
    Ok(())
}
