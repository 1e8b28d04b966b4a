/*
[INPUT]:  XENA_API_KEY, XENA_API_SECRET (hex ed25519 seed), XENA_ACCOUNT
[OUTPUT]: Account state requests and execution reports printed to stdout
[POS]:    Examples - authenticated trading session
[UPDATE]: When the trading session API changes
*/

use rust_decimal::Decimal;
use tokio::time::{Duration, sleep};
use xena_ws_adapter::*;

/// Example: log in, request state and place then cancel one limit order
#[tokio::main]
async fn main() -> Result<()> {
    println!("=== Xena Trading Example ===\n");

    let account: u64 = std::env::var("XENA_ACCOUNT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or_default();
    let credentials = TradingCredentials {
        api_key: std::env::var("XENA_API_KEY").unwrap_or_default(),
        api_secret: std::env::var("XENA_API_SECRET").unwrap_or_default(),
        accounts: vec![account],
    };

    let session = TradingSession::with_credentials(ConnectionConfig::trading(), &credentials)?;
    session.listen_type(MsgType::ExecutionReport, |message: Message| async move {
        if let Message::ExecutionReport(report) = message {
            println!("execution {} {:?} {:?}", report.cl_ord_id, report.exec_type, report.ord_status);
        }
    })?;
    session.listen(|message: Message| async move {
        println!("<- {}", message.msg_type());
    })?;

    let ack = session.connect().await?;
    println!("✓ Logged in, accounts {:?}", ack.account);

    session.account_status_report(account, "example-status").await?;
    session.positions(account).await?;
    session.orders(account).await?;

    session
        .limit_order(
            account,
            "example-1",
            "XBTUSD",
            Side::Buy,
            Decimal::new(1000, 0),
            Decimal::ONE,
        )
        .await?;
    sleep(Duration::from_secs(2)).await;
    session
        .cancel_by_client_id(account, "example-1-cancel", "example-1", "XBTUSD", Side::Buy)
        .await?;

    sleep(Duration::from_secs(3)).await;
    session.close().await;
    println!("\n✓ Trading example complete");
    Ok(())
}
