use crate::cli::Lookback;
use crate::commands::{self, today};
use crate::ui;
use anyhow::Result;
use chrono::NaiveDate;
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Input};
use marlin_core::gateway::{Frequency, MarketData, StatementKind};
use marlin_core::window::Window;
use marlin_core::{MonteCarlo, ScanOptions, SessionCache};
use std::fmt;
use tracing::{error, info};

/// Views of the interactive session, in menu order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Summary,
    PriceVolume,
    Financials,
    MonteCarlo,
    IndustryAnalysis,
    UpdateData,
    ChangeTicker,
    Quit,
}

impl Tab {
    pub const ALL: [Tab; 8] = [
        Tab::Summary,
        Tab::PriceVolume,
        Tab::Financials,
        Tab::MonteCarlo,
        Tab::IndustryAnalysis,
        Tab::UpdateData,
        Tab::ChangeTicker,
        Tab::Quit,
    ];
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tab::Summary => "Summary",
            Tab::PriceVolume => "Price & Volume",
            Tab::Financials => "Financials",
            Tab::MonteCarlo => "Monte Carlo Simulation",
            Tab::IndustryAnalysis => "Industry Analysis",
            Tab::UpdateData => "Update Data",
            Tab::ChangeTicker => "Change Ticker",
            Tab::Quit => "Quit",
        })
    }
}

const SIMULATIONS: [usize; 3] = [200, 500, 1000];
const HORIZONS: [usize; 3] = [30, 60, 90];
const STATEMENTS: [StatementKind; 3] = StatementKind::ALL;
const FREQUENCIES: [Frequency; 2] = [Frequency::Annual, Frequency::Quarterly];

fn default_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default()
}

fn ask_date(prompt: &str, default: NaiveDate) -> Result<NaiveDate> {
    let date = Input::<NaiveDate>::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(default)
        .interact_text()?;
    Ok(date)
}

/// Menu loop over one [`SessionCache`]; every view reads through it, so switching tabs
/// never refetches until "Update Data" clears it.
pub async fn run<G: MarketData>(session: &SessionCache<G>, options: &ScanOptions) -> Result<()> {
    let index = session.constituents().await?;
    let mut ticker = ui::pick_ticker(&index)?;

    loop {
        println!();
        let choice = ui::pick(&format!("{}", ticker.bold()), &Tab::ALL, 0)?;
        let tab = Tab::ALL[choice];
        info!("[{ticker}] {tab}");

        // a failing view reports and returns to the menu
        let outcome = match tab {
            Tab::Summary => {
                let choice = ui::pick("Duration", &Window::ALL, 4)?;
                commands::summary(session, &ticker, Window::ALL[choice]).await
            }
            Tab::PriceVolume => {
                let start = ask_date("Start date", default_start())?;
                let end = ask_date("End date", today())?;
                commands::chart(session, &ticker, start, end).await
            }
            Tab::Financials => {
                let kind = STATEMENTS[ui::pick("Statement", &STATEMENTS, 0)?];
                let frequency = FREQUENCIES[ui::pick("Frequency", &FREQUENCIES, 0)?];
                commands::financials(session, &ticker, kind, frequency).await
            }
            Tab::MonteCarlo => {
                let simulations = SIMULATIONS[ui::pick("Number of simulations", &SIMULATIONS, 0)?];
                let horizon = HORIZONS[ui::pick("Time horizon (days)", &HORIZONS, 0)?];
                let start = ask_date("Start date", default_start())?;
                let end = ask_date("End date", today())?;
                let runner = MonteCarlo {
                    simulations,
                    horizon,
                    seed: None,
                };
                commands::monte_carlo(session, &ticker, &runner, start, end, None).await
            }
            Tab::IndustryAnalysis => {
                let sector = ui::pick_sector(&index)?;
                let days: Vec<usize> = Lookback::ALL.iter().map(Lookback::days).collect();
                let lookback = days[ui::pick("Time period (days)", &days, 1)?];
                let options = ScanOptions {
                    period: commands::period_for(lookback),
                    ..*options
                };
                commands::analysis(session, &sector, lookback, &options).await
            }
            Tab::UpdateData => {
                session.refresh_all().await;
                println!("{}", "Data updated.".green());
                Ok(())
            }
            Tab::ChangeTicker => {
                ticker = ui::pick_ticker(&index)?;
                Ok(())
            }
            Tab::Quit => break,
        };

        if let Err(e) = outcome {
            error!("[{ticker}] {tab} failed: {e}");
            println!("{}", format!("{tab} unavailable: {e}").red());
        }
    }

    let stats = session.stats();
    info!(
        "Session closed; {} cache hits, {} misses",
        stats.hits, stats.misses
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::{day, FakeMarket};

    #[test]
    fn menu_ends_with_quit() {
        assert_eq!(Tab::ALL.last(), Some(&Tab::Quit));
        assert_eq!(Tab::UpdateData.to_string(), "Update Data");
    }

    // what "Update Data" does behind the menu
    #[tokio::test]
    async fn update_data_refetches() {
        let session = SessionCache::new(FakeMarket::default().with("AAPL", "Tech", &[1.0, 2.0], 1.0));
        commands::chart(&session, "AAPL", day(0), day(1)).await.unwrap();
        commands::chart(&session, "AAPL", day(0), day(1)).await.unwrap();
        assert_eq!(session.stats().misses, 1);

        session.refresh_all().await;
        session.price_history("AAPL", commands::HISTORY).await.unwrap();
        assert_eq!(session.stats().misses, 2);
    }
}
