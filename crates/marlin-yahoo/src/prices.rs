use crate::common::{de_timestamps_to_naive_date, http_error, yahoo_symbol};
use chrono::NaiveDate;
use marlin_core::gateway::Period;
use marlin_core::{Error, PriceBar, PriceSeries, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, trace, warn};

///////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Daily prices from Yahoo Finance, per ticker
//
///////////////////////////////////////////////////////////////////////////////////////////////////////

const INTERVAL: &str = "1d";

fn url(ticker: &str, range: &str) -> String {
    let tckr = yahoo_symbol(ticker);
    format!(
        "https://query1.finance.yahoo.com/v8/finance/chart/{tckr}?symbol={tckr}&interval={INTERVAL}&range={range}&events=div|split|capitalGains",
    )
}

pub(crate) async fn fetch(client: &Client, ticker: &str, period: Period) -> Result<PriceSeries> {
    let url = url(ticker, period.as_range());
    trace!("Fetching price data for [{ticker}] from Yahoo Finance");
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| {
            error!("[{ticker}] price fetching error: {e}\nURL: {url}");
            http_error(ticker, e)
        })?
        .bytes()
        .await
        .map_err(|e| {
            error!("[{ticker}] byte transformation error: {e}\nURL: {url}");
            http_error(ticker, e)
        })?;

    // error check the deserialization
    trace!("Deserializing price data for [{ticker}] from Yahoo Finance");
    let de = match serde_json::from_slice::<PriceHistory>(&response) {
        Ok(data) => data,
        Err(e) => {
            error!("[{ticker}] deserialization error: {e}\nURL: {url}");
            return Err(Error::provider(e));
        }
    };

    Ok(into_series(ticker, de))
}

/// Flatten Yahoo's column-wise arrays into bars; days missing a close are dropped.
pub(crate) fn into_series(ticker: &str, de: PriceHistory) -> PriceSeries {
    let Some(base) = de.chart.result.into_iter().flatten().next() else {
        match de.chart.error {
            Some(e) => warn!(
                "[{ticker}] no price data: {} ({}); filling with an empty series instead",
                e.description, e.code
            ),
            None => warn!("[{ticker}] contained no \"chart.result\" object; filling with an empty series instead"),
        }
        return PriceSeries::default();
    };

    let Some(quote) = base.indicators.quote.into_iter().next() else {
        warn!("[{ticker}] contained no quote indicators; filling with an empty series instead");
        return PriceSeries::default();
    };
    let adjclose = base
        .indicators
        .adjclose
        .and_then(|adj| adj.into_iter().next())
        .map(|adj| adj.adjclose)
        .unwrap_or_default();

    let bars = base
        .dates
        .iter()
        .enumerate()
        .filter_map(|(i, dated)| {
            let at = |col: &Vec<Option<f64>>| col.get(i).copied().flatten();
            let close = at(&quote.close)?;
            Some(PriceBar {
                dated: *dated,
                open: at(&quote.open).unwrap_or(close),
                high: at(&quote.high).unwrap_or(close),
                low: at(&quote.low).unwrap_or(close),
                close,
                adj_close: at(&adjclose).unwrap_or(close),
                volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
            })
        })
        .collect::<Vec<_>>();

    trace!("[{ticker}] {} price bars transformed", bars.len());
    PriceSeries::new(bars)
}

///////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Deserialization
//
///////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Deserialize, Debug)]
pub struct PriceHistory {
    pub chart: PriceResponse,
}

#[derive(Deserialize, Debug)]
pub struct PriceResponse {
    pub result: Option<Vec<PriceCategories>>,
    pub error: Option<ChartError>,
}

#[derive(Deserialize, Debug)]
pub struct ChartError {
    pub code: String,
    pub description: String,
}

#[derive(Deserialize, Debug)]
pub struct PriceCategories {
    #[serde(
        rename = "timestamp",
        default,
        deserialize_with = "de_timestamps_to_naive_date"
    )]
    pub dates: Vec<NaiveDate>,
    pub indicators: Indicators,
}

#[derive(Deserialize, Debug)]
pub struct Indicators {
    pub quote: Vec<Quote>,
    pub adjclose: Option<Vec<AdjClose>>,
}

#[derive(Deserialize, Debug)]
pub struct Quote {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<i64>>,
}

#[derive(Deserialize, Debug)]
pub struct AdjClose {
    pub adjclose: Vec<Option<f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHART: &str = r#"{
        "chart": {
            "result": [{
                "meta": { "currency": "USD", "symbol": "AAPL" },
                "timestamp": [1704292200, 1704205800, 1704378600, 1704465000],
                "indicators": {
                    "quote": [{
                        "open":   [184.2, 187.1, null, 181.9],
                        "high":   [185.8, 188.4, null, 182.7],
                        "low":    [183.4, 183.8, null, 180.1],
                        "close":  [184.2, 185.6, null, 181.1],
                        "volume": [58414500, 82488700, null, 62303300]
                    }],
                    "adjclose": [{ "adjclose": [183.7, 185.1, null, 180.6] }]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn chart_payload_becomes_ascending_series() {
        let de: PriceHistory = serde_json::from_str(CHART).unwrap();
        let series = into_series("AAPL", de);

        assert_eq!(series.len(), 3);
        let dates: Vec<String> = series.bars().iter().map(|b| b.dated.to_string()).collect();
        assert_eq!(dates, vec!["2024-01-02", "2024-01-03", "2024-01-05"]);
        assert_eq!(series.bars()[0].close, 185.6);
        assert_eq!(series.bars()[0].volume, 82488700);
        assert_eq!(series.bars()[1].adj_close, 183.7);
        assert_eq!(series.last_close(), Some(181.1));
    }

    #[test]
    fn missing_result_is_an_empty_series() {
        let de: PriceHistory = serde_json::from_str(
            r#"{ "chart": { "result": null, "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" } } }"#,
        )
        .unwrap();
        assert!(into_series("ZZZZ", de).is_empty());
    }

    #[test]
    fn url_uses_yahoo_symbol_and_range() {
        let url = url("brk.b", Period::OneYear.as_range());
        assert!(url.starts_with("https://query1.finance.yahoo.com/v8/finance/chart/BRK-B?symbol=BRK-B"));
        assert!(url.contains("&interval=1d&range=1y"));
    }
}
