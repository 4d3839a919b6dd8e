use crate::error::Result;
use crate::series::PriceSeries;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Market Data Gateway
//
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Everything the analytics need from a market data provider.
///
/// Implemented by the Yahoo Finance client, by the session cache (which wraps any other
/// implementation) and by in-memory fakes in tests.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Members of the tracked index, with their sector classification.
    async fn constituents(&self) -> Result<Vec<Constituent>>;

    async fn profile(&self, symbol: &str) -> Result<Profile>;

    async fn price_history(&self, symbol: &str, period: Period) -> Result<PriceSeries>;

    async fn financial_statements(&self, symbol: &str) -> Result<FinancialStatements>;

    /// `Ok(None)` when the provider has no figure for the symbol.
    async fn shares_outstanding(&self, symbol: &str) -> Result<Option<f64>>;
}

// Individual index member; e.g., `AAPL - Apple Inc. - Information Technology`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Constituent {
    pub symbol: String,
    pub name: String,
    pub sector: String,
    pub sub_industry: String,
}

/// Distinct sectors, in order of first appearance.
pub fn sectors(constituents: &[Constituent]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for c in constituents {
        if !seen.contains(&c.sector) {
            seen.push(c.sector.clone());
        }
    }
    seen
}

/// Symbols of one sector, in index order.
pub fn symbols_in_sector(constituents: &[Constituent], sector: &str) -> Vec<String> {
    constituents
        .iter()
        .filter(|c| c.sector == sector)
        .map(|c| c.symbol.clone())
        .collect()
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Profile {
    pub symbol: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub country: Option<String>,
    pub employee_count: Option<u64>,
    pub summary: Option<String>,
    pub shares_outstanding: Option<f64>,
    pub major_holders: Option<MajorHolders>,
}

/// Ownership breakdown; percentages are fractions (0.61 = 61%).
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct MajorHolders {
    pub insiders_pct: Option<f64>,
    pub institutions_pct: Option<f64>,
    pub institutions_float_pct: Option<f64>,
    pub institutions_count: Option<u64>,
}

/// Look-back range of a price history request.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Period {
    OneMonth,
    SixMonths,
    OneYear,
    TwoYears,
    FiveYears,
    TenYears,
    Max,
}

impl Period {
    /// Range token understood by the chart endpoint.
    pub fn as_range(&self) -> &'static str {
        match self {
            Period::OneMonth => "1mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
            Period::FiveYears => "5y",
            Period::TenYears => "10y",
            Period::Max => "max",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_range())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Financial statements
//
////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatementKind {
    Income,
    BalanceSheet,
    CashFlow,
}

impl StatementKind {
    pub const ALL: [StatementKind; 3] = [
        StatementKind::Income,
        StatementKind::BalanceSheet,
        StatementKind::CashFlow,
    ];
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StatementKind::Income => "Income Statement",
            StatementKind::BalanceSheet => "Balance Sheet",
            StatementKind::CashFlow => "Cash Flow",
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Frequency {
    Annual,
    Quarterly,
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Frequency::Annual => "Annual",
            Frequency::Quarterly => "Quarterly",
        })
    }
}

/// One statement at one frequency: line item -> value per reporting period.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct StatementTable {
    pub rows: BTreeMap<String, BTreeMap<NaiveDate, f64>>,
}

impl StatementTable {
    pub fn insert(&mut self, item: &str, period: NaiveDate, value: f64) {
        self.rows
            .entry(item.to_string())
            .or_default()
            .insert(period, value);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.values().all(|row| row.is_empty())
    }

    /// Every reporting period present in any row, most recent first.
    pub fn periods(&self) -> Vec<NaiveDate> {
        let mut periods: Vec<NaiveDate> = self
            .rows
            .values()
            .flat_map(|row| row.keys().copied())
            .collect();
        periods.sort_unstable_by(|a, b| b.cmp(a));
        periods.dedup();
        periods
    }

    pub fn value(&self, item: &str, period: NaiveDate) -> Option<f64> {
        self.rows.get(item).and_then(|row| row.get(&period)).copied()
    }
}

/// statement -> frequency -> table, as reported by the provider.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct FinancialStatements(pub BTreeMap<StatementKind, BTreeMap<Frequency, StatementTable>>);

impl FinancialStatements {
    pub fn table(&self, kind: StatementKind, frequency: Frequency) -> Option<&StatementTable> {
        self.0.get(&kind).and_then(|tables| tables.get(&frequency))
    }

    pub fn table_mut(&mut self, kind: StatementKind, frequency: Frequency) -> &mut StatementTable {
        self.0
            .entry(kind)
            .or_default()
            .entry(frequency)
            .or_default()
    }
}
