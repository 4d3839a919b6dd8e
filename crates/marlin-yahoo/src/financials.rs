use crate::common::{http_error, raw, yahoo_symbol, Raw};
use chrono::{NaiveDate, Utc};
use marlin_core::gateway::{FinancialStatements, Frequency, StatementKind};
use marlin_core::{Error, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap as Map;
use tracing::{debug, error, trace, warn};

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Income statement, balance sheet & cash flow from the fundamentals-timeseries endpoint
//
////////////////////////////////////////////////////////////////////////////////////////////////////

const INCOME: &[&str] = &[
    "TotalRevenue",
    "CostOfRevenue",
    "GrossProfit",
    "OperatingExpense",
    "OperatingIncome",
    "PretaxIncome",
    "TaxProvision",
    "NetIncome",
    "BasicEPS",
    "DilutedEPS",
    "EBITDA",
];

const BALANCE_SHEET: &[&str] = &[
    "TotalAssets",
    "CurrentAssets",
    "CashAndCashEquivalents",
    "TotalLiabilitiesNetMinorityInterest",
    "CurrentLiabilities",
    "TotalDebt",
    "StockholdersEquity",
    "WorkingCapital",
    "ShareIssued",
];

const CASH_FLOW: &[&str] = &[
    "OperatingCashFlow",
    "InvestingCashFlow",
    "FinancingCashFlow",
    "CapitalExpenditure",
    "FreeCashFlow",
    "RepurchaseOfCapitalStock",
    "CashDividendsPaid",
];

// 1985-08-23; early enough for any listed company's filings
const PERIOD_START: i64 = 493_590_046;

fn line_items(kind: StatementKind) -> &'static [&'static str] {
    match kind {
        StatementKind::Income => INCOME,
        StatementKind::BalanceSheet => BALANCE_SHEET,
        StatementKind::CashFlow => CASH_FLOW,
    }
}

fn prefix(frequency: Frequency) -> &'static str {
    match frequency {
        Frequency::Annual => "annual",
        Frequency::Quarterly => "quarterly",
    }
}

/// Every `{annual|quarterly}{LineItem}` series requested.
fn series_types() -> Vec<String> {
    let mut types = vec![];
    for frequency in [Frequency::Annual, Frequency::Quarterly] {
        for kind in StatementKind::ALL {
            for item in line_items(kind) {
                types.push(format!("{}{item}", prefix(frequency)));
            }
        }
    }
    types
}

/// `quarterlyNetIncome` -> (Income, Quarterly, "NetIncome")
fn classify(series_type: &str) -> Option<(StatementKind, Frequency, &str)> {
    let (frequency, item) = if let Some(item) = series_type.strip_prefix("annual") {
        (Frequency::Annual, item)
    } else if let Some(item) = series_type.strip_prefix("quarterly") {
        (Frequency::Quarterly, item)
    } else {
        return None;
    };
    let kind = StatementKind::ALL
        .into_iter()
        .find(|kind| line_items(*kind).contains(&item))?;
    Some((kind, frequency, item))
}

fn url(ticker: &str) -> String {
    let tckr = yahoo_symbol(ticker);
    let types = series_types().join(",");
    let now = Utc::now().timestamp();
    format!(
        "https://query2.finance.yahoo.com/ws/fundamentals-timeseries/v1/finance/timeseries/{tckr}?symbol={tckr}&type={types}&period1={PERIOD_START}&period2={now}"
    )
}

pub(crate) async fn fetch(client: &Client, ticker: &str) -> Result<FinancialStatements> {
    let time = std::time::Instant::now();
    let url = url(ticker);
    trace!("Fetching financial statements for [{ticker}]");
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| {
            error!("[{ticker}] financials fetching error: {e}\nURL: {url}");
            http_error(ticker, e)
        })?
        .bytes()
        .await
        .map_err(|e| http_error(ticker, e))?;

    let de: TimeseriesResponse = serde_json::from_slice(&response).map_err(|e| {
        error!("[{ticker}] financials deserialization error: {e}\nURL: {url}");
        Error::provider(e)
    })?;

    let statements = into_statements(ticker, de);
    debug!(
        "[{ticker}] financial statements fetched. Elapsed time: {} ms",
        time.elapsed().as_millis()
    );
    Ok(statements)
}

pub(crate) fn into_statements(ticker: &str, de: TimeseriesResponse) -> FinancialStatements {
    let mut statements = FinancialStatements::default();
    for result in de.timeseries.result.into_iter().flatten() {
        let Some(series_type) = result.meta.series_type.first() else {
            continue;
        };
        let Some((kind, frequency, item)) = classify(series_type) else {
            trace!("[{ticker}] ignoring unrequested series {series_type}");
            continue;
        };
        let Some(values) = result.values.get(series_type) else {
            // types without any filings come back with only `meta` and `timestamp`
            continue;
        };

        let observations: Vec<Option<Observation>> = match serde_json::from_value(values.clone()) {
            Ok(obs) => obs,
            Err(e) => {
                warn!("[{ticker}] malformed {series_type} series: {e}");
                continue;
            }
        };

        let table = statements.table_mut(kind, frequency);
        for obs in observations.into_iter().flatten() {
            if let Some(value) = raw(&obs.reported_value) {
                table.insert(item, obs.as_of_date, value);
            }
        }
    }
    statements
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Deserialization
//
////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Deserialize, Debug)]
pub(crate) struct TimeseriesResponse {
    timeseries: TimeseriesResults,
}

#[derive(Deserialize, Debug)]
struct TimeseriesResults {
    result: Option<Vec<TimeseriesResult>>,
}

// each result carries its values under a key named after its own type, e.g.,
// `{ "meta": { "type": ["annualTotalRevenue"] }, "annualTotalRevenue": [ ... ] }`
#[derive(Deserialize, Debug)]
struct TimeseriesResult {
    meta: TimeseriesMeta,
    #[serde(flatten)]
    values: Map<String, Value>,
}

#[derive(Deserialize, Debug)]
struct TimeseriesMeta {
    #[serde(rename = "type")]
    series_type: Vec<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Observation {
    as_of_date: NaiveDate,
    reported_value: Option<Raw>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMESERIES: &str = r#"{
        "timeseries": {
            "result": [
                {
                    "meta": { "symbol": ["AAPL"], "type": ["annualTotalRevenue"] },
                    "timestamp": [1632960000, 1664496000],
                    "annualTotalRevenue": [
                        { "asOfDate": "2021-09-30", "periodType": "12M", "currencyCode": "USD",
                          "reportedValue": { "raw": 365817000000, "fmt": "365.82B" } },
                        { "asOfDate": "2022-09-30", "periodType": "12M", "currencyCode": "USD",
                          "reportedValue": { "raw": 394328000000, "fmt": "394.33B" } }
                    ]
                },
                {
                    "meta": { "symbol": ["AAPL"], "type": ["quarterlyFreeCashFlow"] },
                    "timestamp": [1688083200],
                    "quarterlyFreeCashFlow": [
                        null,
                        { "asOfDate": "2023-06-30", "periodType": "3M", "currencyCode": "USD",
                          "reportedValue": { "raw": 24365000000, "fmt": "24.37B" } }
                    ]
                },
                {
                    "meta": { "symbol": ["AAPL"], "type": ["annualWorkingCapital"] }
                }
            ],
            "error": null
        }
    }"#;

    #[test]
    fn timeseries_become_statement_tables() {
        let de: TimeseriesResponse = serde_json::from_str(TIMESERIES).unwrap();
        let statements = into_statements("AAPL", de);
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();

        let income = statements
            .table(StatementKind::Income, Frequency::Annual)
            .unwrap();
        assert_eq!(income.periods(), vec![d(2022, 9, 30), d(2021, 9, 30)]);
        assert_eq!(income.value("TotalRevenue", d(2021, 9, 30)), Some(365817000000.0));

        let cash = statements
            .table(StatementKind::CashFlow, Frequency::Quarterly)
            .unwrap();
        assert_eq!(cash.value("FreeCashFlow", d(2023, 6, 30)), Some(24365000000.0));

        assert!(statements
            .table(StatementKind::BalanceSheet, Frequency::Annual)
            .is_none());
    }

    #[test]
    fn series_types_cover_every_statement() {
        let types = series_types();
        assert!(types.contains(&"annualTotalRevenue".to_string()));
        assert!(types.contains(&"quarterlyStockholdersEquity".to_string()));
        assert!(types.contains(&"annualFreeCashFlow".to_string()));
        for t in &types {
            assert!(classify(t).is_some(), "{t} does not classify");
        }
    }

    #[test]
    fn classify_rejects_unknown() {
        assert_eq!(
            classify("quarterlyNetIncome"),
            Some((StatementKind::Income, Frequency::Quarterly, "NetIncome"))
        );
        assert_eq!(classify("annualSomethingElse"), None);
        assert_eq!(classify("trailingTotalRevenue"), None);
    }
}
