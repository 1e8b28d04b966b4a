/*
[INPUT]:  A fallible connect attempt, backoff policy, shutdown token
[OUTPUT]: The first successful attempt, or None after giving up or shutdown
[POS]:    Reconnection layer - capped exponential backoff shared by runners
[UPDATE]: When changing retry limits or backoff growth
*/

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use xena_ws_adapter::Result;

use crate::config::ReconnectConfig;

/// 1s, 2s, 4s ... clamped at `max`
pub fn backoff_duration(retry_count: u32, max: Duration) -> Duration {
    let exp = retry_count.saturating_sub(1).min(63);
    let secs = 1u64 << exp;
    Duration::from_secs(secs).min(max)
}

/// Retry `attempt` until it succeeds, fails with a non-retryable error,
/// exhausts `policy.max_retries` or `shutdown` fires.
pub async fn retry_with_backoff<T, F, Fut>(
    label: &str,
    policy: &ReconnectConfig,
    shutdown: &CancellationToken,
    mut attempt: F,
) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut retry_count = 0u32;
    loop {
        let outcome = tokio::select! {
            _ = shutdown.cancelled() => return None,
            outcome = attempt() => outcome,
        };

        let err = match outcome {
            Ok(value) => {
                if retry_count > 0 {
                    info!(label, retry_count, "reconnected");
                }
                return Some(value);
            }
            Err(err) => err,
        };

        retry_count = retry_count.saturating_add(1);
        if !err.is_retryable() {
            warn!(label, error = %err, "reconnect failed with non-retryable error; giving up");
            return None;
        }
        if retry_count >= policy.max_retries {
            warn!(label, retry_count, max_retries = policy.max_retries, error = %err, "gave up reconnecting");
            return None;
        }

        let backoff = backoff_duration(retry_count, policy.max_backoff());
        warn!(label, retry_count, ?backoff, error = %err, "connect failed; retrying with backoff");
        tokio::select! {
            _ = shutdown.cancelled() => return None,
            _ = tokio::time::sleep(backoff) => {}
        }
    }
}
