use crate::series::PriceSeries;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Price/volume chart point; `direction` colours the volume bar.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PriceVolumeRow {
    pub dated: NaiveDate,
    pub close: f64,
    pub volume: i64,
    pub direction: Direction,
}

/// Down when the close fell against the previous bar, Up otherwise (the first bar is Up).
pub fn price_volume_rows(series: &PriceSeries) -> Vec<PriceVolumeRow> {
    let mut prev: Option<f64> = None;
    series
        .bars()
        .iter()
        .map(|bar| {
            let direction = match prev {
                Some(p) if bar.close < p => Direction::Down,
                _ => Direction::Up,
            };
            prev = Some(bar.close);
            PriceVolumeRow {
                dated: bar.dated,
                close: bar.close,
                volume: bar.volume,
                direction,
            }
        })
        .collect()
}

/// Upper bound for the volume axis: 20% headroom over the busiest day.
pub fn volume_ceiling(series: &PriceSeries) -> f64 {
    series
        .bars()
        .iter()
        .map(|bar| bar.volume)
        .max()
        .unwrap_or(0) as f64
        * 1.2
}
