/*
[INPUT]:  Error sources (codec, registry, websocket, session API misuse, signing)
[OUTPUT]: Structured error type with retry and usage-error hints
[POS]:    Error handling layer - unified error type for the entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use thiserror::Error;

/// Main error type for the Xena websocket adapter
#[derive(Error, Debug)]
pub enum XenaError {
    /// Payload carried a message type the registry does not know
    #[error("Unknown or unsupported MsgType \"{0}\"")]
    UnknownMessageType(String),

    /// Handshake reply was not a Logon or carried a rejection
    #[error("Login failed: {0}")]
    LoginFailed(String),

    /// Stream id already has an active consumer
    #[error("Subscription for stream {0} already exists")]
    DuplicateSubscription(String),

    /// Stream id has no active consumer
    #[error("Subscription for stream {0} doesn't exist")]
    NoSuchSubscription(String),

    /// Message type (or the catch-all slot) already has a listener
    #[error("Listener for \"{0}\" already exists")]
    DuplicateListener(String),

    /// Malformed call: empty required field, wrong message shape
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Payload did not match the shape described by the schema
    #[error("Decode error: {0}")]
    Decode(String),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Websocket transport error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Remote side closed the channel
    #[error("Connection closed by remote")]
    ConnectionClosed,

    /// Operation needs an open channel
    #[error("Not connected")]
    NotConnected,

    /// Logon payload could not be signed
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl XenaError {
    /// Check if the error is a transport condition worth reconnecting for
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            XenaError::WebSocket(_) | XenaError::ConnectionClosed | XenaError::NotConnected
        )
    }

    /// Check if error is a caller programming error on the session API
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            XenaError::DuplicateSubscription(_)
                | XenaError::NoSuchSubscription(_)
                | XenaError::DuplicateListener(_)
                | XenaError::InvalidArgument(_)
        )
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for XenaError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        match err {
            tokio_tungstenite::tungstenite::Error::ConnectionClosed
            | tokio_tungstenite::tungstenite::Error::AlreadyClosed => XenaError::ConnectionClosed,
            other => XenaError::WebSocket(other.to_string()),
        }
    }
}

/// Result type alias for Xena operations
pub type Result<T> = std::result::Result<T, XenaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_retryable() {
        assert!(XenaError::ConnectionClosed.is_retryable());
        assert!(XenaError::WebSocket("reset".to_string()).is_retryable());
        assert!(!XenaError::LoginFailed("bad key".to_string()).is_retryable());
    }

    #[test]
    fn test_error_is_usage_error() {
        assert!(XenaError::DuplicateListener("8".to_string()).is_usage_error());
        assert!(XenaError::NoSuchSubscription("trades:BTC/USDT".to_string()).is_usage_error());
        assert!(!XenaError::UnknownMessageType("ZZ".to_string()).is_usage_error());
    }

    #[test]
    fn test_unknown_message_type_display() {
        let err = XenaError::UnknownMessageType("ZZ".to_string());
        assert_eq!(err.to_string(), "Unknown or unsupported MsgType \"ZZ\"");
    }

    #[test]
    fn test_tungstenite_closed_maps_to_connection_closed() {
        let err: XenaError = tokio_tungstenite::tungstenite::Error::ConnectionClosed.into();
        assert!(matches!(err, XenaError::ConnectionClosed));
    }
}
