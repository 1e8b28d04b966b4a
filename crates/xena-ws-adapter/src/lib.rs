/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public Xena streaming client crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod auth;
pub mod codec;
pub mod commands;
pub mod config;
pub mod error;
pub mod registry;
pub mod types;
pub mod ws;

pub use auth::{Ed25519LogonSigner, LogonBuilder, LogonSigner, MockLogonSigner};
pub use codec::{Decoded, KeyMode, WireMessage, decode, decode_as, encode};
pub use config::{ConnectionConfig, MARKET_DATA_URL, TRADING_URL, TradingCredentials};
pub use error::{Result, XenaError};
pub use registry::Message;

// Re-export all types
pub use types::*;

pub use ws::{
    Connection, ConnectionLostHandler, ConnectionState, Listener, MarketDataSession,
    SubscribeOptions, TradingSession,
};
