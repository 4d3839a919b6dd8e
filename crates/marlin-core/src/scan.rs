use crate::error::{Error, Result};
use crate::gateway::{MarketData, Period};
use crate::series::PriceSeries;
use futures::StreamExt;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, trace};

/// Size of the ranking table.
pub const TOP_N: usize = 10;

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Cross-sectional market cap scan
//
////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy)]
pub struct ScanOptions {
    /// Symbols fetched at once.
    pub concurrency: usize,
    /// Deadline for all provider calls of a single symbol.
    pub timeout: Duration,
    /// History requested per symbol.
    pub period: Period,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            concurrency: num_cpus::get(),
            timeout: Duration::from_secs(30),
            period: Period::OneYear,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RankingEntry {
    pub symbol: String,
    pub market_cap_change: f64,
}

/// Why a symbol was left out of the ranking.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoSharesOutstanding,
    EmptyHistory,
    InsufficientHistory { have: usize, need: usize },
    Timeout,
    Fetch(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoSharesOutstanding => write!(f, "no shares outstanding"),
            SkipReason::EmptyHistory => write!(f, "empty price history"),
            SkipReason::InsufficientHistory { have, need } => {
                write!(f, "{have} observations, {need} required")
            }
            SkipReason::Timeout => write!(f, "timed out"),
            SkipReason::Fetch(msg) => write!(f, "fetch failed: {msg}"),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub enum SymbolOutcome {
    Ranked(RankingEntry),
    Skipped { symbol: String, reason: SkipReason },
}

impl SymbolOutcome {
    pub fn symbol(&self) -> &str {
        match self {
            SymbolOutcome::Ranked(entry) => &entry.symbol,
            SymbolOutcome::Skipped { symbol, .. } => symbol,
        }
    }
}

/// `Empty` when no symbol of the universe produced a value; never an empty `Top`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub enum Ranking {
    Top(Vec<RankingEntry>),
    Empty,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ScanReport {
    pub ranking: Ranking,
    pub skipped: Vec<(String, SkipReason)>,
}

/// `(latest close - close lookback observations earlier) * shares`.
pub fn market_cap_change(
    series: &PriceSeries,
    shares_outstanding: f64,
    lookback: usize,
) -> std::result::Result<f64, SkipReason> {
    if series.is_empty() {
        return Err(SkipReason::EmptyHistory);
    }
    let need = lookback + 1;
    match (series.last_close(), series.close_back(lookback)) {
        (Some(end), Some(start)) => Ok((end - start) * shares_outstanding),
        _ => Err(SkipReason::InsufficientHistory {
            have: series.len(),
            need,
        }),
    }
}

async fn evaluate<G: MarketData + ?Sized>(
    gateway: &G,
    symbol: &str,
    lookback: usize,
    period: Period,
) -> std::result::Result<RankingEntry, SkipReason> {
    let shares = match gateway.shares_outstanding(symbol).await {
        Ok(Some(shares)) => shares,
        Ok(None) | Err(Error::DataUnavailable { .. }) => {
            return Err(SkipReason::NoSharesOutstanding)
        }
        Err(Error::Timeout { .. }) => return Err(SkipReason::Timeout),
        Err(e) => return Err(SkipReason::Fetch(e.to_string())),
    };

    let history = match gateway.price_history(symbol, period).await {
        Ok(history) => history,
        Err(Error::Timeout { .. }) => return Err(SkipReason::Timeout),
        Err(e) => return Err(SkipReason::Fetch(e.to_string())),
    };

    let delta = market_cap_change(&history, shares, lookback)?;
    Ok(RankingEntry {
        symbol: symbol.to_string(),
        market_cap_change: delta,
    })
}

/// Fetch and evaluate one symbol; every failure is folded into a [`SkipReason`].
pub async fn evaluate_symbol<G: MarketData + ?Sized>(
    gateway: &G,
    symbol: &str,
    lookback: usize,
    options: &ScanOptions,
) -> SymbolOutcome {
    let result = tokio::time::timeout(
        options.timeout,
        evaluate(gateway, symbol, lookback, options.period),
    )
    .await
    .unwrap_or(Err(SkipReason::Timeout));

    match result {
        Ok(entry) => {
            trace!("[{symbol}] market cap change: {}", entry.market_cap_change);
            SymbolOutcome::Ranked(entry)
        }
        Err(reason) => {
            match &reason {
                SkipReason::Fetch(_) | SkipReason::Timeout => {
                    error!("[{symbol}] skipped from scan: {reason}")
                }
                _ => debug!("[{symbol}] skipped from scan: {reason}"),
            }
            SymbolOutcome::Skipped {
                symbol: symbol.to_string(),
                reason,
            }
        }
    }
}

/// Evaluate every symbol on a bounded pool of concurrent fetches.
///
/// Outcomes come back in universe order; `progress` is called as each symbol completes.
pub async fn scan_universe<G, F>(
    gateway: &G,
    symbols: &[String],
    lookback: usize,
    options: &ScanOptions,
    progress: F,
) -> Vec<SymbolOutcome>
where
    G: MarketData + ?Sized,
    F: Fn(&SymbolOutcome),
{
    let time = std::time::Instant::now();
    let width = options.concurrency.max(1);

    let mut indexed: Vec<(usize, SymbolOutcome)> = futures::stream::iter(symbols.iter().enumerate())
        .map(|(i, symbol)| async move {
            (i, evaluate_symbol(gateway, symbol, lookback, options).await)
        })
        .buffer_unordered(width)
        .inspect(|(_, outcome)| progress(outcome))
        .collect()
        .await;
    indexed.sort_by_key(|(i, _)| *i);

    debug!(
        "{} symbols scanned over {lookback} days. Elapsed time: {} ms",
        symbols.len(),
        time.elapsed().as_millis()
    );

    indexed.into_iter().map(|(_, outcome)| outcome).collect()
}

/// Rank outcomes by market cap change, descending, keeping the top [`TOP_N`].
///
/// Ties keep universe order.
pub fn rank(outcomes: &[SymbolOutcome]) -> Ranking {
    let mut entries: Vec<RankingEntry> = outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            SymbolOutcome::Ranked(entry) => Some(entry.clone()),
            SymbolOutcome::Skipped { .. } => None,
        })
        .collect();

    if entries.is_empty() {
        return Ranking::Empty;
    }

    entries.sort_by(|a, b| b.market_cap_change.total_cmp(&a.market_cap_change));
    entries.truncate(TOP_N);
    Ranking::Top(entries)
}

fn validate_lookback(lookback: usize) -> Result<()> {
    if lookback == 0 {
        return Err(Error::InvalidParameter(
            "lookback window must be at least one trading day".to_string(),
        ));
    }
    Ok(())
}

/// Scan `symbols` and rank them by market cap change over `lookback` trading days.
pub async fn rank_by_market_cap_change<G: MarketData + ?Sized>(
    gateway: &G,
    symbols: &[String],
    lookback: usize,
    options: &ScanOptions,
) -> Result<ScanReport> {
    rank_with_progress(gateway, symbols, lookback, options, |_| {}).await
}

/// [`rank_by_market_cap_change`] with a per-symbol completion callback.
pub async fn rank_with_progress<G, F>(
    gateway: &G,
    symbols: &[String],
    lookback: usize,
    options: &ScanOptions,
    progress: F,
) -> Result<ScanReport>
where
    G: MarketData + ?Sized,
    F: Fn(&SymbolOutcome),
{
    validate_lookback(lookback)?;
    let outcomes = scan_universe(gateway, symbols, lookback, options, progress).await;
    let ranking = rank(&outcomes);
    let skipped = outcomes
        .into_iter()
        .filter_map(|outcome| match outcome {
            SymbolOutcome::Skipped { symbol, reason } => Some((symbol, reason)),
            SymbolOutcome::Ranked(_) => None,
        })
        .collect();

    Ok(ScanReport { ranking, skipped })
}
