use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use marlin_core::gateway::{Frequency, StatementKind};
use marlin_core::window::Window;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Sets the level of tracing
    #[arg(long, default_value = "WARN", ignore_case = true)]
    pub trace: TraceLevel,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the sectors of the index.
    Sectors,

    /// Company profile, ownership and price performance over a preset window.
    Summary {
        #[arg(long)]
        ticker: Option<String>,

        #[arg(long, default_value = "1y")]
        window: WindowArg,
    },

    /// Daily close & volume between two dates.
    Chart {
        #[arg(long)]
        ticker: Option<String>,

        #[arg(long, default_value = "2020-01-01")]
        start: NaiveDate,

        /// Defaults to today.
        #[arg(long)]
        end: Option<NaiveDate>,
    },

    /// Income statement, balance sheet or cash flow.
    Financials {
        #[arg(long)]
        ticker: Option<String>,

        #[arg(long, default_value = "income")]
        statement: StatementArg,

        #[arg(long, default_value = "annual")]
        frequency: FrequencyArg,
    },

    /// Bootstrap simulation of future prices from historical daily returns.
    MonteCarlo {
        #[arg(long)]
        ticker: Option<String>,

        /// Number of simulated paths (200, 500 or 1000 are typical).
        #[arg(long, default_value_t = 200, value_parser = clap::value_parser!(u64).range(1..))]
        simulations: u64,

        /// Trading days simulated (30, 60 or 90 are typical).
        #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
        horizon: u64,

        /// Fix the random source for a repeatable run.
        #[arg(long)]
        seed: Option<u64>,

        #[arg(long, default_value = "2020-01-01")]
        start: NaiveDate,

        /// Defaults to today.
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Write every simulated path to a JSON file.
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Top 10 companies of a sector by market capitalization change.
    Analysis {
        #[arg(long)]
        sector: Option<String>,

        #[arg(long, default_value = "30")]
        lookback: Lookback,
    },

    /// Interactive session over every view, with a shared cache.
    Dashboard,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum WindowArg {
    #[value(name = "1m")]
    OneMonth,
    #[value(name = "3m")]
    ThreeMonths,
    #[value(name = "6m")]
    SixMonths,
    Ytd,
    #[value(name = "1y")]
    OneYear,
    #[value(name = "3y")]
    ThreeYears,
    #[value(name = "5y")]
    FiveYears,
    Max,
}

impl From<WindowArg> for Window {
    fn from(arg: WindowArg) -> Self {
        match arg {
            WindowArg::OneMonth => Window::OneMonth,
            WindowArg::ThreeMonths => Window::ThreeMonths,
            WindowArg::SixMonths => Window::SixMonths,
            WindowArg::Ytd => Window::YearToDate,
            WindowArg::OneYear => Window::OneYear,
            WindowArg::ThreeYears => Window::ThreeYears,
            WindowArg::FiveYears => Window::FiveYears,
            WindowArg::Max => Window::Max,
        }
    }
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum StatementArg {
    Income,
    BalanceSheet,
    CashFlow,
}

impl From<StatementArg> for StatementKind {
    fn from(arg: StatementArg) -> Self {
        match arg {
            StatementArg::Income => StatementKind::Income,
            StatementArg::BalanceSheet => StatementKind::BalanceSheet,
            StatementArg::CashFlow => StatementKind::CashFlow,
        }
    }
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrequencyArg {
    Annual,
    Quarterly,
}

impl From<FrequencyArg> for Frequency {
    fn from(arg: FrequencyArg) -> Self {
        match arg {
            FrequencyArg::Annual => Frequency::Annual,
            FrequencyArg::Quarterly => Frequency::Quarterly,
        }
    }
}

/// Trading days looked back by the sector analysis.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum Lookback {
    #[value(name = "1")]
    Day,
    #[value(name = "30")]
    Month,
    #[value(name = "90")]
    Quarter,
    #[value(name = "180")]
    HalfYear,
    #[value(name = "365")]
    Year,
}

impl Lookback {
    pub const ALL: [Lookback; 5] = [
        Lookback::Day,
        Lookback::Month,
        Lookback::Quarter,
        Lookback::HalfYear,
        Lookback::Year,
    ];

    pub fn days(&self) -> usize {
        match self {
            Lookback::Day => 1,
            Lookback::Month => 30,
            Lookback::Quarter => 90,
            Lookback::HalfYear => 180,
            Lookback::Year => 365,
        }
    }
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum TraceLevel {
    #[value(name = "DEBUG")]
    DEBUG,
    #[value(name = "INFO")]
    INFO,
    #[value(name = "WARN")]
    WARN,
    #[value(name = "ERROR")]
    ERROR,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_monte_carlo_flags() {
        let cli = Cli::parse_from([
            "marlin",
            "monte-carlo",
            "--ticker",
            "AAPL",
            "--simulations",
            "500",
            "--horizon",
            "60",
            "--seed",
            "7",
            "--start",
            "2021-06-01",
        ]);
        match cli.command {
            Commands::MonteCarlo {
                ticker,
                simulations,
                horizon,
                seed,
                start,
                end,
                json,
            } => {
                assert_eq!(ticker.as_deref(), Some("AAPL"));
                assert_eq!((simulations, horizon, seed), (500, 60, Some(7)));
                assert_eq!(start, NaiveDate::from_ymd_opt(2021, 6, 1).unwrap());
                assert_eq!(end, None);
                assert_eq!(json, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.trace, TraceLevel::WARN);
    }

    #[test]
    fn lookback_and_window_names() {
        let cli = Cli::parse_from(["marlin", "analysis", "--lookback", "180"]);
        assert!(matches!(
            cli.command,
            Commands::Analysis { sector: None, lookback: Lookback::HalfYear }
        ));

        let cli = Cli::parse_from(["marlin", "summary", "--window", "ytd"]);
        assert!(matches!(
            cli.command,
            Commands::Summary { window: WindowArg::Ytd, .. }
        ));
    }

    #[test]
    fn rejects_zero_simulations_and_unknown_lookback() {
        assert!(Cli::try_parse_from(["marlin", "monte-carlo", "--simulations", "0"]).is_err());
        assert!(Cli::try_parse_from(["marlin", "analysis", "--lookback", "45"]).is_err());
    }

    #[test]
    fn cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
