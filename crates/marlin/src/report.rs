use chrono::NaiveDate;
use colored::Colorize;
use marlin_core::chart::{Direction, PriceVolumeRow};
use marlin_core::gateway::{sectors, Constituent, Frequency, Profile, StatementKind, StatementTable};
use marlin_core::scan::SkipReason;
use marlin_core::window::Window;
use marlin_core::{PriceSeries, Ranking, ScanReport, SimulationBatch};

pub const NO_RANKING: &str = "No data available for the selected industry and period.";
pub const NO_DATA: &str = "No data available.";

// most recent reporting periods shown side by side
const STATEMENT_COLUMNS: usize = 5;

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Number formatting
//
////////////////////////////////////////////////////////////////////////////////////////////////////

/// `394328000000.0` -> `394.33B`; keeps the sign.
pub fn fmt_large(value: f64) -> String {
    let abs = value.abs();
    let (scaled, suffix) = if abs >= 1e12 {
        (value / 1e12, "T")
    } else if abs >= 1e9 {
        (value / 1e9, "B")
    } else if abs >= 1e6 {
        (value / 1e6, "M")
    } else if abs >= 1e3 {
        (value / 1e3, "K")
    } else {
        (value, "")
    };
    format!("{scaled:.2}{suffix}")
}

/// Fraction to percentage, `0.6131` -> `61.31%`.
pub fn fmt_pct(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

fn or_dash(value: Option<String>) -> String {
    value.unwrap_or_else(|| "-".to_string())
}

fn signed(value: f64, text: String) -> String {
    if value < 0.0 {
        text.red().to_string()
    } else {
        text.green().to_string()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Views
//
////////////////////////////////////////////////////////////////////////////////////////////////////

pub fn sector_list(index: &[Constituent]) -> String {
    sectors(index)
        .into_iter()
        .map(|sector| {
            let members = index.iter().filter(|c| c.sector == sector).count();
            format!("{sector:<28} {members:>4}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn profile(profile: &Profile) -> String {
    let mut lines = vec![format!(
        "{} ({})",
        profile.name.as_deref().unwrap_or(&profile.symbol).bold(),
        profile.symbol
    )];
    lines.push(format!("{:<24}{}", "Sector", or_dash(profile.sector.clone())));
    lines.push(format!("{:<24}{}", "Industry", or_dash(profile.industry.clone())));
    lines.push(format!("{:<24}{}", "Country", or_dash(profile.country.clone())));
    lines.push(format!(
        "{:<24}{}",
        "Employees",
        or_dash(profile.employee_count.map(|n| n.to_string()))
    ));
    lines.push(format!(
        "{:<24}{}",
        "Shares outstanding",
        or_dash(profile.shares_outstanding.map(fmt_large))
    ));

    if let Some(holders) = &profile.major_holders {
        lines.push(String::new());
        lines.push("Major holders".bold().to_string());
        lines.push(format!(
            "{:<24}{}",
            "Insiders",
            or_dash(holders.insiders_pct.map(fmt_pct))
        ));
        lines.push(format!(
            "{:<24}{}",
            "Institutions",
            or_dash(holders.institutions_pct.map(fmt_pct))
        ));
        lines.push(format!(
            "{:<24}{}",
            "Institutions (float)",
            or_dash(holders.institutions_float_pct.map(fmt_pct))
        ));
        lines.push(format!(
            "{:<24}{}",
            "Institutions (count)",
            or_dash(holders.institutions_count.map(|n| n.to_string()))
        ));
    }

    if let Some(summary) = &profile.summary {
        lines.push(String::new());
        lines.push(summary.clone());
    }
    lines.join("\n")
}

/// Performance of a windowed series: first & last close, change, range and volume.
pub fn window_performance(window: Window, series: &PriceSeries) -> String {
    let (Some(first), Some(last)) = (series.bars().first(), series.bars().last()) else {
        return format!("{window}: {NO_DATA}");
    };
    let change = last.close - first.close;
    let change_pct = if first.close != 0.0 {
        change / first.close
    } else {
        0.0
    };
    let high = series.bars().iter().map(|b| b.high).fold(f64::MIN, f64::max);
    let low = series.bars().iter().map(|b| b.low).fold(f64::MAX, f64::min);
    let volume: i64 = series.bars().iter().map(|b| b.volume).sum();

    [
        format!("{} ({} to {})", window.to_string().bold(), first.dated, last.dated),
        format!("{:<24}{:.2}", "Close", last.close),
        format!(
            "{:<24}{}",
            "Change",
            signed(change, format!("{change:+.2} ({})", fmt_pct(change_pct)))
        ),
        format!("{:<24}{low:.2} - {high:.2}", "Range"),
        format!("{:<24}{}", "Volume", fmt_large(volume as f64)),
        format!("{:<24}{}", "Trading days", series.len()),
    ]
    .join("\n")
}

pub fn price_volume(rows: &[PriceVolumeRow], ceiling: f64) -> String {
    if rows.is_empty() {
        return NO_DATA.to_string();
    }
    const BAR_WIDTH: f64 = 30.0;
    let mut lines = vec![format!("{:<12}{:>12}{:>14}", "Date", "Close", "Volume")
        .bold()
        .to_string()];
    for row in rows {
        let width = if ceiling > 0.0 {
            (row.volume as f64 / ceiling * BAR_WIDTH).round() as usize
        } else {
            0
        };
        let bar = "#".repeat(width);
        let bar = match row.direction {
            Direction::Up => bar.green(),
            Direction::Down => bar.red(),
        };
        lines.push(format!(
            "{:<12}{:>12.2}{:>14} {bar}",
            row.dated.to_string(),
            row.close,
            fmt_large(row.volume as f64)
        ));
    }
    lines.join("\n")
}

pub fn statement(
    table: Option<&StatementTable>,
    kind: StatementKind,
    frequency: Frequency,
) -> String {
    let Some(table) = table.filter(|t| !t.is_empty()) else {
        return NO_DATA.to_string();
    };
    let periods: Vec<NaiveDate> = table.periods().into_iter().take(STATEMENT_COLUMNS).collect();

    let mut header = format!("{:<38}", format!("{kind} ({frequency})"));
    for period in &periods {
        header.push_str(&format!("{:>14}", period.to_string()));
    }
    let mut lines = vec![header.bold().to_string()];

    for item in table.rows.keys() {
        let mut line = format!("{item:<38}");
        for period in &periods {
            let cell = table
                .value(item, *period)
                .map(fmt_large)
                .unwrap_or_else(|| "-".to_string());
            line.push_str(&format!("{cell:>14}"));
        }
        lines.push(line);
    }
    lines.join("\n")
}

pub fn simulation(ticker: &str, batch: &SimulationBatch) -> String {
    let Some(summary) = batch.terminal_summary() else {
        return format!("{ticker}: {NO_DATA}");
    };
    let row = |label: &str, value: f64| {
        let pct = (value - batch.start_price) / batch.start_price;
        format!(
            "{label:<24}{value:>12.2}  {}",
            signed(pct, format!("{:>+8.2}%", pct * 100.0))
        )
    };
    [
        format!(
            "{} {} paths over {} trading days from {:.2}",
            ticker.bold(),
            batch.paths.len(),
            batch.horizon,
            batch.start_price
        ),
        row("Minimum", summary.min),
        row("5th percentile", summary.p5),
        row("25th percentile", summary.p25),
        row("Median", summary.median),
        row("75th percentile", summary.p75),
        row("95th percentile", summary.p95),
        row("Maximum", summary.max),
        row("Mean", summary.mean),
        format!(
            "{:<24}{:>12}",
            "P(below start)",
            fmt_pct(summary.prob_below_start)
        ),
    ]
    .join("\n")
}

pub fn ranking(sector: &str, lookback: usize, report: &ScanReport) -> String {
    let Ranking::Top(entries) = &report.ranking else {
        return NO_RANKING.to_string();
    };
    let mut lines = vec![format!(
        "{} top {} by market cap change over {lookback} trading days",
        sector.bold(),
        entries.len()
    )];
    for (i, entry) in entries.iter().enumerate() {
        lines.push(format!(
            "{:>3}. {:<8}{:>14}",
            i + 1,
            entry.symbol,
            signed(entry.market_cap_change, fmt_large(entry.market_cap_change))
        ));
    }
    if !report.skipped.is_empty() {
        lines.push(format!("({} skipped)", report.skipped.len()).dimmed().to_string());
    }
    lines.join("\n")
}

/// One line per symbol left out of a ranking.
pub fn skipped(skipped: &[(String, SkipReason)]) -> String {
    skipped
        .iter()
        .map(|(symbol, reason)| format!("{symbol:<8}{reason}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use marlin_core::chart::price_volume_rows;
    use marlin_core::gateway::MajorHolders;
    use marlin_core::scan::RankingEntry;
    use marlin_core::{PriceBar, SimulatedPath};

    fn plain() {
        colored::control::set_override(false);
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn bar(d: u32, close: f64, volume: i64) -> PriceBar {
        PriceBar {
            dated: day(d),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            adj_close: close,
            volume,
        }
    }

    #[test]
    fn large_numbers_are_abbreviated() {
        assert_eq!(fmt_large(394_328_000_000.0), "394.33B");
        assert_eq!(fmt_large(-1_200_000.0), "-1.20M");
        assert_eq!(fmt_large(2_500_000_000_000.0), "2.50T");
        assert_eq!(fmt_large(812.5), "812.50");
        assert_eq!(fmt_pct(0.6131), "61.31%");
    }

    #[test]
    fn empty_ranking_has_its_own_message() {
        plain();
        let report = ScanReport {
            ranking: Ranking::Empty,
            skipped: vec![("A".to_string(), SkipReason::NoSharesOutstanding)],
        };
        assert_eq!(ranking("Utilities", 30, &report), NO_RANKING);
    }

    #[test]
    fn ranking_lists_entries_in_order() {
        plain();
        let report = ScanReport {
            ranking: Ranking::Top(vec![
                RankingEntry {
                    symbol: "C".to_string(),
                    market_cap_change: 2_000_000_000.0,
                },
                RankingEntry {
                    symbol: "D".to_string(),
                    market_cap_change: -5_000_000.0,
                },
            ]),
            skipped: vec![],
        };
        let text = ranking("Industrials", 90, &report);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("1. C") && lines[1].contains("2.00B"));
        assert!(lines[2].contains("2. D") && lines[2].contains("-5.00M"));
    }

    #[test]
    fn missing_statement_prints_no_data() {
        plain();
        assert_eq!(
            statement(None, StatementKind::Income, Frequency::Annual),
            NO_DATA
        );
        let empty = StatementTable::default();
        assert_eq!(
            statement(Some(&empty), StatementKind::CashFlow, Frequency::Quarterly),
            NO_DATA
        );
    }

    #[test]
    fn statement_columns_are_most_recent_first() {
        plain();
        let mut table = StatementTable::default();
        table.insert("TotalRevenue", day(1), 1_000_000.0);
        table.insert("TotalRevenue", day(2), 2_000_000.0);
        table.insert("NetIncome", day(2), 500_000.0);

        let text = statement(Some(&table), StatementKind::Income, Frequency::Annual);
        let header = text.lines().next().unwrap();
        assert!(header.find("2024-03-02").unwrap() < header.find("2024-03-01").unwrap());
        assert!(text.contains("NetIncome"));
        let net_income = text.lines().find(|l| l.starts_with("NetIncome")).unwrap();
        assert!(net_income.contains("500.00K") && net_income.trim_end().ends_with('-'));
    }

    #[test]
    fn price_volume_marks_falling_days() {
        plain();
        let series = PriceSeries::new(vec![bar(1, 10.0, 100), bar(2, 9.0, 200), bar(3, 9.5, 50)]);
        let text = price_volume(&price_volume_rows(&series), 200.0);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("2024-03-02") && lines[2].ends_with(&"#".repeat(30)));
        assert_eq!(price_volume(&[], 0.0), NO_DATA);
    }

    #[test]
    fn window_performance_reports_change() {
        plain();
        let series = PriceSeries::new(vec![bar(1, 100.0, 10), bar(4, 110.0, 20)]);
        let text = window_performance(Window::OneMonth, &series);
        assert!(text.contains("+10.00 (10.00%)"));
        assert!(text.contains("99.00 - 111.00"));
        assert!(window_performance(Window::Max, &PriceSeries::default()).ends_with(NO_DATA));
    }

    #[test]
    fn profile_shows_holders_when_present() {
        plain();
        let mut p = Profile {
            symbol: "AAPL".to_string(),
            name: Some("Apple Inc.".to_string()),
            ..Profile::default()
        };
        assert!(!profile(&p).contains("Major holders"));
        p.major_holders = Some(MajorHolders {
            institutions_pct: Some(0.6131),
            ..MajorHolders::default()
        });
        let text = profile(&p);
        assert!(text.starts_with("Apple Inc. (AAPL)"));
        assert!(text.contains("61.31%"));
    }

    #[test]
    fn simulation_summarises_terminal_prices() {
        plain();
        let batch = SimulationBatch {
            start_price: 100.0,
            horizon: 2,
            paths: vec![
                SimulatedPath::from(vec![100.0, 90.0]),
                SimulatedPath::from(vec![100.0, 110.0]),
            ],
        };
        let text = simulation("AAPL", &batch);
        assert!(text.starts_with("AAPL 2 paths over 2 trading days from 100.00"));
        assert!(text.contains("50.00%"));
    }

    #[test]
    fn simulation_without_paths_prints_no_data() {
        plain();
        let batch = SimulationBatch {
            start_price: 100.0,
            horizon: 5,
            paths: vec![],
        };
        assert_eq!(simulation("AAPL", &batch), format!("AAPL: {NO_DATA}"));
    }
}
