use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single trading day of OHLCV data.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub dated: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: i64,
}

/// Daily price history for one symbol, ascending by date with no duplicate dates.
///
/// ```ignore
/// let series = PriceSeries::new(bars);
/// let last = series.last_close();
/// let ytd = series.since(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(from = "Vec<PriceBar>")]
pub struct PriceSeries(Vec<PriceBar>);

impl PriceSeries {
    /// Sorts `bars` by date; where a date repeats, the later bar in the input wins.
    pub fn new(mut bars: Vec<PriceBar>) -> Self {
        // stable sort keeps input order within a date, so the last duplicate survives
        bars.sort_by_key(|bar| bar.dated);
        let mut deduped: Vec<PriceBar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(prev) if prev.dated == bar.dated => *prev = bar,
                _ => deduped.push(bar),
            }
        }
        PriceSeries(deduped)
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn closes(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().map(|bar| bar.close)
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.0.first().map(|bar| bar.dated)
    }

    pub fn last_close(&self) -> Option<f64> {
        self.0.last().map(|bar| bar.close)
    }

    /// Close `n` observations before the latest one.
    pub fn close_back(&self, n: usize) -> Option<f64> {
        let last = self.0.len().checked_sub(1)?;
        let idx = last.checked_sub(n)?;
        Some(self.0[idx].close)
    }

    /// Bars dated on or after `start`.
    pub fn since(&self, start: NaiveDate) -> PriceSeries {
        PriceSeries(
            self.0
                .iter()
                .filter(|bar| bar.dated >= start)
                .cloned()
                .collect(),
        )
    }

    /// Bars dated within `start..=end`.
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> PriceSeries {
        PriceSeries(
            self.0
                .iter()
                .filter(|bar| bar.dated >= start && bar.dated <= end)
                .cloned()
                .collect(),
        )
    }
}

impl From<Vec<PriceBar>> for PriceSeries {
    fn from(bars: Vec<PriceBar>) -> Self {
        PriceSeries::new(bars)
    }
}
