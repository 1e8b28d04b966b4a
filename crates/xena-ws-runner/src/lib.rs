/*
[INPUT]:  Public API exports for xena-ws-runner crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod config;
pub mod market_data;
pub mod reconnect;
pub mod trading;

// Re-export main types for convenience
pub use config::RunnerConfig;
pub use market_data::MarketDataRunner;
pub use trading::TradingRunner;
