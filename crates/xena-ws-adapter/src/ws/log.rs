/*
[INPUT]:  Raw frames and decoded messages seen on the read loop
[OUTPUT]: Rate-limited tracing output
[POS]:    WebSocket layer - log sampling helpers shared by both sessions
[UPDATE]: When changing log volume or sampling limits
*/

use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, info};

use crate::error::XenaError;
use crate::registry::Message;

const MESSAGE_SAMPLE_LIMIT: usize = 3;
const DECODE_FAIL_LOG_LIMIT: usize = 3;
pub(crate) const RAW_LOG_MAX_BYTES: usize = 1024;

static MESSAGE_SAMPLE_COUNT: AtomicUsize = AtomicUsize::new(0);
static DECODE_FAIL_LOG_COUNT: AtomicUsize = AtomicUsize::new(0);

pub(crate) fn log_message_sample_once(route: &str, message: &Message) {
    let count = MESSAGE_SAMPLE_COUNT.fetch_add(1, Ordering::Relaxed);
    if count >= MESSAGE_SAMPLE_LIMIT {
        return;
    }

    match message.md_stream_id() {
        Some(stream_id) => info!(
            sample_index = count + 1,
            sample_limit = MESSAGE_SAMPLE_LIMIT,
            route,
            msg_type = %message.msg_type(),
            stream_id,
            "ws message sample"
        ),
        None => info!(
            sample_index = count + 1,
            sample_limit = MESSAGE_SAMPLE_LIMIT,
            route,
            msg_type = %message.msg_type(),
            "ws message sample"
        ),
    }
}

/// Sampled at info, every failure still reaches debug
pub(crate) fn log_decode_fail(route: &str, err: &XenaError, raw: &str) {
    let count = DECODE_FAIL_LOG_COUNT.fetch_add(1, Ordering::Relaxed);
    if count < DECODE_FAIL_LOG_LIMIT {
        info!(
            sample_index = count + 1,
            sample_limit = DECODE_FAIL_LOG_LIMIT,
            route,
            error = %err,
            bytes = raw.len(),
            "ws message decode failed"
        );
    }
    let preview = truncate_for_log(raw, RAW_LOG_MAX_BYTES);
    debug!(route, error = %err, message = %preview, "ws message decode failed");
}

pub(crate) fn truncate_for_log(value: &str, max_len: usize) -> String {
    if value.len() <= max_len {
        return value.to_string();
    }
    let mut end = max_len;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = String::with_capacity(end + 3);
    out.push_str(&value[..end]);
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_value_untouched() {
        assert_eq!(truncate_for_log("{\"35\":\"0\"}", 64), "{\"35\":\"0\"}");
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        let out = truncate_for_log("ééé", 3);
        assert_eq!(out, "é...");
    }
}
