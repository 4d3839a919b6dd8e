use crate::config::Config;
use crate::{financials, index, prices, profile};
use async_trait::async_trait;
use marlin_core::gateway::{Constituent, FinancialStatements, MarketData, Period, Profile};
use marlin_core::{Error, PriceSeries, Result};
use reqwest::Client;
use tracing::debug;

/// [`MarketData`] backed by Yahoo Finance's public endpoints.
#[derive(Debug, Clone)]
pub struct YahooFinance {
    http: Client,
    config: Config,
}

pub fn build_client(config: &Config) -> Result<Client> {
    let client = reqwest::ClientBuilder::new()
        .user_agent(&config.user_agent)
        .timeout(config.timeout)
        .build()
        .map_err(Error::provider)?;
    Ok(client)
}

impl YahooFinance {
    pub fn new(config: Config) -> Result<Self> {
        let http = build_client(&config)?;
        debug!(
            "Yahoo Finance client built; user agent \"{}\", timeout {:?}",
            config.user_agent, config.timeout
        );
        Ok(Self { http, config })
    }

    /// [`Config::from_env`], then [`YahooFinance::new`].
    pub fn from_env() -> Result<Self> {
        Self::new(Config::from_env()?)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

#[async_trait]
impl MarketData for YahooFinance {
    async fn constituents(&self) -> Result<Vec<Constituent>> {
        index::fetch(&self.http, &self.config.constituents_url).await
    }

    async fn profile(&self, symbol: &str) -> Result<Profile> {
        let summary = profile::fetch(&self.http, symbol, profile::PROFILE_MODULES).await?;
        Ok(summary.into_profile(symbol))
    }

    async fn price_history(&self, symbol: &str, period: Period) -> Result<PriceSeries> {
        prices::fetch(&self.http, symbol, period).await
    }

    async fn financial_statements(&self, symbol: &str) -> Result<FinancialStatements> {
        financials::fetch(&self.http, symbol).await
    }

    async fn shares_outstanding(&self, symbol: &str) -> Result<Option<f64>> {
        let summary = profile::fetch(&self.http, symbol, profile::SHARES_MODULES).await?;
        Ok(summary.shares_outstanding())
    }
}
