/// The [`MarketData`](marlin_core::MarketData) implementation.
pub mod client;

/// Environment-driven provider settings.
pub mod config;

mod common;
mod financials;
mod index;
mod prices;
mod profile;

pub use client::YahooFinance;
pub use common::yahoo_symbol;
pub use config::Config;
