use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands::*, TraceLevel};
use commands::today;
use marlin_core::gateway::Period;
use marlin_core::{ScanOptions, SessionCache};
use marlin_yahoo::{Config, YahooFinance};
use tracing::{debug, subscriber, trace, Level};
use tracing_subscriber::FmtSubscriber;

mod cli;
mod commands;
mod dashboard;
mod report;
mod ui;

fn preprocess(trace_level: Level) -> Result<()> {
    dotenv::dotenv().ok();
    let my_subscriber = FmtSubscriber::builder()
        .with_max_level(trace_level)
        .with_writer(std::io::stderr)
        .finish();
    subscriber::set_global_default(my_subscriber)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.trace {
        TraceLevel::DEBUG => Level::DEBUG,
        TraceLevel::INFO => Level::INFO,
        TraceLevel::WARN => Level::WARN,
        TraceLevel::ERROR => Level::ERROR,
    };

    preprocess(log_level)?;
    trace!("Command line input recorded: {cli:#?}");

    let config = Config::from_env()?;
    debug!("{config:#?}");
    let options = ScanOptions {
        concurrency: config.concurrency,
        timeout: config.timeout,
        period: Period::OneYear,
    };
    let session = SessionCache::new(YahooFinance::new(config)?);

    ////////////////////////////////////////////////////////////////////////////////////////////////////

    // cli framework:
    // "> marlin <COMMAND>"
    match cli.command {
        // "> marlin sectors"
        Sectors => commands::sectors(&session).await?,

        // "> marlin summary [--ticker] [--window]"
        Summary { ticker, window } => {
            let ticker = commands::resolve_ticker(&session, ticker).await?;
            commands::summary(&session, &ticker, window.into()).await?;
        }

        // "> marlin chart [--ticker] [--start] [--end]"
        Chart { ticker, start, end } => {
            let ticker = commands::resolve_ticker(&session, ticker).await?;
            commands::chart(&session, &ticker, start, end.unwrap_or_else(today)).await?;
        }

        // "> marlin financials [--ticker] [--statement] [--frequency]"
        Financials {
            ticker,
            statement,
            frequency,
        } => {
            let ticker = commands::resolve_ticker(&session, ticker).await?;
            commands::financials(&session, &ticker, statement.into(), frequency.into()).await?;
        }

        // "> marlin monte-carlo [--ticker] [--simulations] [--horizon] [--seed] [--start] [--end] [--json]"
        MonteCarlo {
            ticker,
            simulations,
            horizon,
            seed,
            start,
            end,
            json,
        } => {
            let ticker = commands::resolve_ticker(&session, ticker).await?;
            let runner = marlin_core::MonteCarlo {
                simulations: simulations as usize,
                horizon: horizon as usize,
                seed,
            };
            commands::monte_carlo(
                &session,
                &ticker,
                &runner,
                start,
                end.unwrap_or_else(today),
                json.as_deref(),
            )
            .await?;
        }

        // "> marlin analysis [--sector] [--lookback]"
        Analysis { sector, lookback } => {
            let sector = commands::resolve_sector(&session, sector).await?;
            let days = lookback.days();
            let options = ScanOptions {
                period: commands::period_for(days),
                ..options
            };
            commands::analysis(&session, &sector, days, &options).await?;
        }

        // "> marlin dashboard"
        Dashboard => dashboard::run(&session, &options).await?,
    }

    Ok(())
}
