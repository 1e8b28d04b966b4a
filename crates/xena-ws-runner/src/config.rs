/*
[INPUT]:  YAML configuration file
[OUTPUT]: Parsed runner configuration (endpoints, credentials, streams, backoff)
[POS]:    Configuration layer - runner setup
[UPDATE]: When adding new configuration options
*/

use std::time::Duration;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use xena_ws_adapter::{
    ConnectionConfig, MARKET_DATA_URL, SubscribeOptions, TRADING_URL, ThrottleTimeUnit,
    TradingCredentials,
};

/// Top-level configuration for the runner
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RunnerConfig {
    #[serde(default)]
    pub market_data: MarketDataConfig,
    /// Required by the `trading` subcommand only
    #[serde(default)]
    pub trading: Option<TradingConfig>,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MarketDataConfig {
    #[serde(default = "default_market_data_url")]
    pub url: String,
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,
    #[serde(default)]
    pub subscriptions: Vec<SubscriptionConfig>,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            url: default_market_data_url(),
            heartbeat_secs: default_heartbeat_secs(),
            subscriptions: Vec::new(),
        }
    }
}

impl MarketDataConfig {
    pub fn connection(&self) -> ConnectionConfig {
        ConnectionConfig::new(self.url.clone()).with_heartbeat_secs(self.heartbeat_secs)
    }
}

/// One market-data stream, tagged by `kind`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubscriptionConfig {
    Candles {
        symbol: String,
        #[serde(default = "default_timeframe")]
        timeframe: String,
        #[serde(default)]
        throttle_ms: Option<i64>,
    },
    Dom {
        symbol: String,
        #[serde(default)]
        depth: Option<i64>,
        #[serde(default)]
        aggregation: Option<i64>,
        #[serde(default)]
        throttle_ms: Option<i64>,
    },
    Trades {
        symbol: String,
        #[serde(default)]
        throttle_ms: Option<i64>,
    },
    MarketWatch,
}

impl SubscriptionConfig {
    pub fn options(&self) -> SubscribeOptions {
        let with_throttle = |options: SubscribeOptions, throttle_ms: &Option<i64>| match throttle_ms {
            Some(ms) => options.throttle(*ms, ThrottleTimeUnit::Milliseconds),
            None => options,
        };
        match self {
            SubscriptionConfig::Candles { throttle_ms, .. } => {
                with_throttle(SubscribeOptions::candles(), throttle_ms)
            }
            SubscriptionConfig::Dom {
                depth,
                aggregation,
                throttle_ms,
                ..
            } => {
                let mut options = with_throttle(SubscribeOptions::default(), throttle_ms);
                options.depth = *depth;
                options.aggregation = *aggregation;
                options
            }
            SubscriptionConfig::Trades { throttle_ms, .. } => {
                with_throttle(SubscribeOptions::default(), throttle_ms)
            }
            SubscriptionConfig::MarketWatch => SubscribeOptions::default(),
        }
    }
}

#[derive(Clone, Deserialize, Serialize)]
pub struct TradingConfig {
    #[serde(default = "default_trading_url")]
    pub url: String,
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,
    pub api_key: String,
    /// Hex-encoded Ed25519 secret
    pub api_secret: String,
    #[serde(default)]
    pub accounts: Vec<u64>,
}

impl std::fmt::Debug for TradingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TradingConfig")
            .field("url", &self.url)
            .field("heartbeat_secs", &self.heartbeat_secs)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("accounts", &self.accounts)
            .finish()
    }
}

impl TradingConfig {
    pub fn connection(&self) -> ConnectionConfig {
        ConnectionConfig::new(self.url.clone()).with_heartbeat_secs(self.heartbeat_secs)
    }

    pub fn credentials(&self) -> TradingCredentials {
        TradingCredentials {
            api_key: self.api_key.clone(),
            api_secret: self.api_secret.clone(),
            accounts: self.accounts.clone(),
        }
    }
}

/// Backoff applied after an unexpected connection loss
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReconnectConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            max_backoff_secs: default_max_backoff_secs(),
        }
    }
}

impl ReconnectConfig {
    pub fn max_backoff(&self) -> Duration {
        Duration::from_secs(self.max_backoff_secs.max(1))
    }
}

fn default_market_data_url() -> String {
    MARKET_DATA_URL.to_string()
}

fn default_trading_url() -> String {
    TRADING_URL.to_string()
}

fn default_heartbeat_secs() -> u64 {
    15
}

fn default_timeframe() -> String {
    "1m".to_string()
}

fn default_max_retries() -> u32 {
    10
}

fn default_max_backoff_secs() -> u64 {
    30
}

impl RunnerConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        Ok(config)
    }

    pub fn validate_market_data(&self) -> anyhow::Result<()> {
        if self.market_data.subscriptions.is_empty() {
            bail!("market_data.subscriptions must list at least one stream");
        }
        self.market_data
            .connection()
            .endpoint()
            .context("market_data.url")?;
        Ok(())
    }

    pub fn trading(&self) -> anyhow::Result<&TradingConfig> {
        let trading = self
            .trading
            .as_ref()
            .context("missing `trading` section")?;
        trading.connection().endpoint().context("trading.url")?;
        if trading.accounts.is_empty() {
            bail!("trading.accounts must list at least one account");
        }
        Ok(trading)
    }

    /// Everything `trading()` checks plus the signing credentials
    pub fn validate_trading(&self) -> anyhow::Result<()> {
        self.trading()?
            .credentials()
            .logon_builder()
            .context("trading.api_key / trading.api_secret")?;
        Ok(())
    }
}
