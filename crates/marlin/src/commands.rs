use crate::report;
use crate::ui;
use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use marlin_core::chart::{price_volume_rows, volume_ceiling};
use marlin_core::gateway::{symbols_in_sector, Frequency, MarketData, Period, StatementKind};
use marlin_core::scan::{rank_with_progress, SymbolOutcome};
use marlin_core::window::Window;
use marlin_core::{sample_returns, MonteCarlo, ScanOptions, ScanReport, SimulationBatch};
use std::path::Path;
use tracing::{debug, error, info, trace, warn};

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// One function per view; each fetches through the gateway, then prints.
//
////////////////////////////////////////////////////////////////////////////////////////////////////

/// History behind the summary, chart and simulation views; bounds the MAX window.
pub const HISTORY: Period = Period::FiveYears;

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// The ticker given on the command line, or one picked from the index.
pub async fn resolve_ticker<G: MarketData + ?Sized>(
    market: &G,
    ticker: Option<String>,
) -> Result<String> {
    match ticker {
        Some(t) => Ok(t.trim().to_uppercase()),
        None => ui::pick_ticker(&market.constituents().await?),
    }
}

pub async fn resolve_sector<G: MarketData + ?Sized>(
    market: &G,
    sector: Option<String>,
) -> Result<String> {
    match sector {
        Some(s) => Ok(s),
        None => ui::pick_sector(&market.constituents().await?),
    }
}

pub async fn sectors<G: MarketData + ?Sized>(market: &G) -> Result<()> {
    let index = market.constituents().await?;
    println!("{}", report::sector_list(&index));
    Ok(())
}

/// Profile, window performance and the windowed price/volume rows, as printed.
pub async fn summary_view<G: MarketData + ?Sized>(
    market: &G,
    ticker: &str,
    window: Window,
    today: NaiveDate,
) -> Result<String> {
    let mut sections = vec![];
    // a missing profile still leaves the price performance worth showing
    match market.profile(ticker).await {
        Ok(profile) => sections.push(report::profile(&profile)),
        Err(e) => warn!("[{ticker}] no profile: {e}"),
    }
    let history = market.price_history(ticker, HISTORY).await?;
    let windowed = window.apply(&history, today);
    sections.push(report::window_performance(window, &windowed));
    if !windowed.is_empty() {
        sections.push(report::price_volume(
            &price_volume_rows(&windowed),
            volume_ceiling(&windowed),
        ));
    }
    Ok(sections.join("\n\n"))
}

pub async fn summary<G: MarketData + ?Sized>(market: &G, ticker: &str, window: Window) -> Result<()> {
    println!("{}", summary_view(market, ticker, window, today()).await?);
    Ok(())
}

pub async fn chart<G: MarketData + ?Sized>(
    market: &G,
    ticker: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<()> {
    let history = market.price_history(ticker, HISTORY).await?;
    let ranged = history.between(start, end);
    debug!("[{ticker}] {} bars between {start} and {end}", ranged.len());
    println!(
        "{}",
        report::price_volume(&price_volume_rows(&ranged), volume_ceiling(&ranged))
    );
    Ok(())
}

pub async fn financials<G: MarketData + ?Sized>(
    market: &G,
    ticker: &str,
    kind: StatementKind,
    frequency: Frequency,
) -> Result<()> {
    let statements = market.financial_statements(ticker).await?;
    println!(
        "{}",
        report::statement(statements.table(kind, frequency), kind, frequency)
    );
    Ok(())
}

/// Bootstrap paths from the daily returns between `start` and `end`, starting at the last
/// close of that range.
pub async fn simulate<G: MarketData + ?Sized>(
    market: &G,
    ticker: &str,
    runner: &MonteCarlo,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<SimulationBatch> {
    let history = market.price_history(ticker, HISTORY).await?;
    let ranged = history.between(start, end);
    let sample = sample_returns(&ranged).map_err(|e| {
        error!("[{ticker}] cannot sample returns between {start} and {end}: {e}");
        e
    })?;
    let start_price = ranged
        .last_close()
        .ok_or_else(|| anyhow!("[{ticker}] no close between {start} and {end}"))?;
    trace!(
        "[{ticker}] {} returns sampled, starting at {start_price:.2}",
        sample.len()
    );
    Ok(runner.run(&sample, start_price)?)
}

pub async fn monte_carlo<G: MarketData + ?Sized>(
    market: &G,
    ticker: &str,
    runner: &MonteCarlo,
    start: NaiveDate,
    end: NaiveDate,
    json: Option<&Path>,
) -> Result<()> {
    let batch = simulate(market, ticker, runner, start, end).await?;
    println!("{}", report::simulation(ticker, &batch));

    if let Some(path) = json {
        let bytes = serde_json::to_vec_pretty(&batch)?;
        tokio::fs::write(path, bytes).await.map_err(|e| {
            error!("failed to write simulation to {}: {e}", path.display());
            e
        })?;
        info!("{} paths written to {}", batch.paths.len(), path.display());
    }
    Ok(())
}

/// History long enough to look `lookback` trading days back (~252 per year).
pub fn period_for(lookback: usize) -> Period {
    if lookback < 250 {
        Period::OneYear
    } else {
        Period::TwoYears
    }
}

/// Rank one sector, advancing a progress bar per completed symbol.
pub async fn rank_sector<G: MarketData + ?Sized>(
    market: &G,
    sector: &str,
    lookback: usize,
    options: &ScanOptions,
) -> Result<ScanReport> {
    let index = market.constituents().await?;
    let symbols = symbols_in_sector(&index, sector);
    if symbols.is_empty() {
        warn!("no constituents in sector \"{sector}\"");
    }
    info!("Ranking {} symbols of {sector}", symbols.len());

    let pb = ui::single_pb(symbols.len() as u64);
    let report = rank_with_progress(market, &symbols, lookback, options, |outcome| {
        pb.set_message(outcome.symbol().to_string());
        if let SymbolOutcome::Skipped { symbol, reason } = outcome {
            debug!("[{symbol}] skipped: {reason}");
        }
        pb.inc(1);
    })
    .await?;
    pb.finish_and_clear();
    Ok(report)
}

pub async fn analysis<G: MarketData + ?Sized>(
    market: &G,
    sector: &str,
    lookback: usize,
    options: &ScanOptions,
) -> Result<()> {
    let report = rank_sector(market, sector, lookback, options).await?;
    println!("{}", report::ranking(sector, lookback, &report));
    if !report.skipped.is_empty() {
        debug!("skipped symbols:\n{}", report::skipped(&report.skipped));
    }
    Ok(())
}
