/*
[INPUT]:  Endpoint URLs, keepalive defaults, API credentials
[OUTPUT]: Validated connection configuration and logon builders
[POS]:    Config layer - explicit construction-time settings
[UPDATE]: When adding connection options or credential formats
*/

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::auth::{Ed25519LogonSigner, LogonBuilder};
use crate::error::{Result, XenaError};

/// Default endpoints
pub const MARKET_DATA_URL: &str = "wss://api.xena.exchange/ws/market-data";
pub const TRADING_URL: &str = "wss://api.xena.exchange/ws/trading";

const DEFAULT_HEARTBEAT_SECS: u64 = 15;

fn default_heartbeat_secs() -> u64 {
    DEFAULT_HEARTBEAT_SECS
}

/// Settings for one websocket connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub url: String,
    /// Keepalive period used when the logon ack carries no interval
    #[serde(default = "default_heartbeat_secs")]
    pub default_heartbeat_secs: u64,
}

impl ConnectionConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            default_heartbeat_secs: DEFAULT_HEARTBEAT_SECS,
        }
    }

    pub fn market_data() -> Self {
        Self::new(MARKET_DATA_URL)
    }

    pub fn trading() -> Self {
        Self::new(TRADING_URL)
    }

    pub fn with_heartbeat_secs(mut self, secs: u64) -> Self {
        self.default_heartbeat_secs = secs;
        self
    }

    pub fn default_heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.default_heartbeat_secs.max(1))
    }

    /// Parse the endpoint, rejecting anything that is not `ws://` or `wss://`
    pub fn endpoint(&self) -> Result<Url> {
        let url = Url::parse(&self.url)?;
        match url.scheme() {
            "ws" | "wss" => Ok(url),
            other => Err(XenaError::Config(format!(
                "unsupported websocket scheme \"{other}\" in {}",
                self.url
            ))),
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::trading()
    }
}

/// API key credentials for the trading session
#[derive(Clone, Deserialize)]
pub struct TradingCredentials {
    pub api_key: String,
    /// Hex-encoded Ed25519 secret
    pub api_secret: String,
    #[serde(default)]
    pub accounts: Vec<u64>,
}

impl std::fmt::Debug for TradingCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TradingCredentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("accounts", &self.accounts)
            .finish()
    }
}

impl TradingCredentials {
    pub fn logon_builder(&self) -> Result<LogonBuilder> {
        if self.api_key.is_empty() {
            return Err(XenaError::Config("api_key must not be empty".to_string()));
        }
        let signer = Ed25519LogonSigner::from_secret_hex(&self.api_secret)?;
        Ok(LogonBuilder::new(
            self.api_key.clone(),
            self.accounts.clone(),
            Arc::new(signer),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_default_endpoints() {
        assert_eq!(ConnectionConfig::market_data().url, MARKET_DATA_URL);
        assert_eq!(ConnectionConfig::default().url, TRADING_URL);
        assert_ok!(ConnectionConfig::trading().endpoint());
    }

    #[test]
    fn test_endpoint_rejects_http() {
        let config = ConnectionConfig::new("https://api.xena.exchange/ws/trading");
        assert!(matches!(config.endpoint(), Err(XenaError::Config(_))));
        assert_err!(ConnectionConfig::new("not a url").endpoint());
    }

    #[test]
    fn test_heartbeat_default_from_serde() {
        let config: ConnectionConfig =
            serde_json::from_str(r#"{"url":"ws://127.0.0.1:9000"}"#).unwrap();
        assert_eq!(config.default_heartbeat_interval(), Duration::from_secs(15));
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let credentials = TradingCredentials {
            api_key: "key".to_string(),
            api_secret: "00".repeat(32),
            accounts: vec![1],
        };
        let debug = format!("{credentials:?}");
        assert!(!debug.contains(&"00".repeat(32)));
        assert_ok!(credentials.logon_builder());
    }
}
