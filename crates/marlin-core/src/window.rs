use crate::series::PriceSeries;
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Preset chart durations, counted back from today in calendar days.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Window {
    OneMonth,
    ThreeMonths,
    SixMonths,
    YearToDate,
    OneYear,
    ThreeYears,
    FiveYears,
    Max,
}

impl Window {
    pub const ALL: [Window; 8] = [
        Window::OneMonth,
        Window::ThreeMonths,
        Window::SixMonths,
        Window::YearToDate,
        Window::OneYear,
        Window::ThreeYears,
        Window::FiveYears,
        Window::Max,
    ];

    fn days(&self) -> Option<i64> {
        match self {
            Window::OneMonth => Some(30),
            Window::ThreeMonths => Some(90),
            Window::SixMonths => Some(180),
            Window::OneYear => Some(365),
            Window::ThreeYears => Some(1095),
            Window::FiveYears => Some(1825),
            Window::YearToDate | Window::Max => None,
        }
    }

    /// First date included in the window; `None` only for `Max` over an empty series.
    pub fn start(&self, today: NaiveDate, series: &PriceSeries) -> Option<NaiveDate> {
        match self {
            Window::YearToDate => NaiveDate::from_ymd_opt(today.year(), 1, 1),
            Window::Max => series.first_date(),
            _ => self.days().map(|days| today - Duration::days(days)),
        }
    }

    pub fn apply(&self, series: &PriceSeries, today: NaiveDate) -> PriceSeries {
        match self.start(today, series) {
            Some(start) => series.since(start),
            None => series.clone(),
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Window::OneMonth => "1M",
            Window::ThreeMonths => "3M",
            Window::SixMonths => "6M",
            Window::YearToDate => "YTD",
            Window::OneYear => "1Y",
            Window::ThreeYears => "3Y",
            Window::FiveYears => "5Y",
            Window::Max => "MAX",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::tests::{date, series};

    #[test]
    fn fixed_windows_count_calendar_days() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        let s = series(&[1.0]);
        assert_eq!(
            Window::OneMonth.start(today, &s),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert_eq!(
            Window::OneYear.start(today, &s),
            NaiveDate::from_ymd_opt(2023, 4, 1)
        );
    }

    #[test]
    fn ytd_and_max() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let s = series(&[1.0, 2.0]);
        assert_eq!(
            Window::YearToDate.start(today, &s),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(Window::Max.start(today, &s), Some(date(0)));
        assert_eq!(Window::Max.start(today, &PriceSeries::default()), None);
    }

    #[test]
    fn apply_filters_from_start() {
        // 2024-01-01 .. 2024-01-10
        let s = series(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]);
        let today = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let month = Window::OneMonth.apply(&s, today);
        assert_eq!(month.first_date(), Some(date(0)));
        assert_eq!(month.len(), 10);

        let today = NaiveDate::from_ymd_opt(2024, 2, 6).unwrap();
        let month = Window::OneMonth.apply(&s, today);
        assert_eq!(month.first_date(), Some(date(6)));
        assert_eq!(month.len(), 4);
    }
}
