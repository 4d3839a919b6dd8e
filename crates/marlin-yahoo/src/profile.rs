use crate::common::{http_error, raw, yahoo_symbol, Raw};
use marlin_core::gateway::{MajorHolders, Profile};
use marlin_core::{Error, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, trace};

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Company profile, share count & ownership from the quoteSummary endpoint
//
////////////////////////////////////////////////////////////////////////////////////////////////////

pub(crate) const PROFILE_MODULES: &str =
    "assetProfile,price,defaultKeyStatistics,majorHoldersBreakdown";
pub(crate) const SHARES_MODULES: &str = "defaultKeyStatistics";

fn url(ticker: &str, modules: &str) -> String {
    let tckr = yahoo_symbol(ticker);
    format!("https://query2.finance.yahoo.com/v10/finance/quoteSummary/{tckr}?modules={modules}")
}

pub(crate) async fn fetch(client: &Client, ticker: &str, modules: &str) -> Result<Summary> {
    let url = url(ticker, modules);
    trace!("Fetching quote summary [{modules}] for [{ticker}]");
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| {
            error!("[{ticker}] quote summary fetching error: {e}\nURL: {url}");
            http_error(ticker, e)
        })?
        .bytes()
        .await
        .map_err(|e| http_error(ticker, e))?;

    let de: SummaryResponse = serde_json::from_slice(&response).map_err(|e| {
        error!("[{ticker}] quote summary deserialization error: {e}\nURL: {url}");
        Error::provider(e)
    })?;

    de.quote_summary
        .result
        .into_iter()
        .flatten()
        .next()
        .ok_or_else(|| {
            if let Some(e) = &de.quote_summary.error {
                error!("[{ticker}] quote summary error: {} ({})", e.description, e.code);
            }
            Error::unavailable(ticker, "quote summary")
        })
}

impl Summary {
    pub(crate) fn shares_outstanding(&self) -> Option<f64> {
        self.default_key_statistics
            .as_ref()
            .and_then(|stats| raw(&stats.shares_outstanding))
    }

    pub(crate) fn into_profile(self, ticker: &str) -> Profile {
        let shares_outstanding = self.shares_outstanding();
        let asset = self.asset_profile.unwrap_or_default();
        let name = self
            .price
            .and_then(|p| p.long_name.or(p.short_name));
        let major_holders = self.major_holders_breakdown.map(|h| MajorHolders {
            insiders_pct: raw(&h.insiders_percent_held),
            institutions_pct: raw(&h.institutions_percent_held),
            institutions_float_pct: raw(&h.institutions_float_percent_held),
            institutions_count: raw(&h.institutions_count).map(|n| n as u64),
        });

        Profile {
            symbol: ticker.to_string(),
            name,
            sector: asset.sector,
            industry: asset.industry,
            country: asset.country,
            employee_count: asset.full_time_employees,
            summary: asset.long_business_summary,
            shares_outstanding,
            major_holders,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Deserialization
//
////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SummaryResponse {
    quote_summary: SummaryResult,
}

#[derive(Deserialize, Debug)]
pub(crate) struct SummaryResult {
    result: Option<Vec<Summary>>,
    error: Option<SummaryError>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct SummaryError {
    code: String,
    description: String,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Summary {
    asset_profile: Option<AssetProfile>,
    price: Option<PriceModule>,
    default_key_statistics: Option<KeyStatistics>,
    major_holders_breakdown: Option<HoldersBreakdown>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct AssetProfile {
    sector: Option<String>,
    industry: Option<String>,
    country: Option<String>,
    full_time_employees: Option<u64>,
    long_business_summary: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    long_name: Option<String>,
    short_name: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct KeyStatistics {
    shares_outstanding: Option<Raw>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct HoldersBreakdown {
    insiders_percent_held: Option<Raw>,
    institutions_percent_held: Option<Raw>,
    institutions_float_percent_held: Option<Raw>,
    institutions_count: Option<Raw>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUMMARY: &str = r#"{
        "quoteSummary": {
            "result": [{
                "assetProfile": {
                    "address1": "One Apple Park Way",
                    "country": "United States",
                    "industry": "Consumer Electronics",
                    "sector": "Technology",
                    "fullTimeEmployees": 161000,
                    "longBusinessSummary": "Apple Inc. designs, manufactures, and markets smartphones."
                },
                "price": { "longName": "Apple Inc.", "shortName": "Apple Inc." },
                "defaultKeyStatistics": {
                    "sharesOutstanding": { "raw": 15204100096, "fmt": "15.2B", "longFmt": "15,204,100,096" }
                },
                "majorHoldersBreakdown": {
                    "insidersPercentHeld": { "raw": 0.0271, "fmt": "2.71%" },
                    "institutionsPercentHeld": { "raw": 0.6131, "fmt": "61.31%" },
                    "institutionsFloatPercentHeld": { "raw": 0.63017, "fmt": "63.02%" },
                    "institutionsCount": { "raw": 6478, "fmt": "6.48k", "longFmt": "6,478" }
                }
            }],
            "error": null
        }
    }"#;

    fn parse(json: &str) -> Option<Summary> {
        let de: SummaryResponse = serde_json::from_str(json).unwrap();
        de.quote_summary.result.into_iter().flatten().next()
    }

    #[test]
    fn summary_becomes_profile() {
        let profile = parse(SUMMARY).unwrap().into_profile("AAPL");
        assert_eq!(profile.name.as_deref(), Some("Apple Inc."));
        assert_eq!(profile.sector.as_deref(), Some("Technology"));
        assert_eq!(profile.industry.as_deref(), Some("Consumer Electronics"));
        assert_eq!(profile.country.as_deref(), Some("United States"));
        assert_eq!(profile.employee_count, Some(161000));
        assert_eq!(profile.shares_outstanding, Some(15204100096.0));
        let holders = profile.major_holders.unwrap();
        assert_eq!(holders.institutions_count, Some(6478));
        assert_eq!(holders.insiders_pct, Some(0.0271));
    }

    #[test]
    fn missing_share_count_is_none() {
        let summary = parse(
            r#"{ "quoteSummary": { "result": [{ "defaultKeyStatistics": { "sharesOutstanding": {} } }], "error": null } }"#,
        )
        .unwrap();
        assert_eq!(summary.shares_outstanding(), None);

        let profile = summary.into_profile("XYZ");
        assert_eq!(profile.name, None);
        assert_eq!(profile.major_holders, None);
    }

    #[test]
    fn error_payload_has_no_result() {
        let json = r#"{ "quoteSummary": { "result": null, "error": { "code": "Not Found", "description": "Quote not found for ticker symbol: ZZZZ" } } }"#;
        assert!(parse(json).is_none());
    }
}
