use chrono::{DateTime, NaiveDate};
use marlin_core::Error;
use serde::{Deserialize, Deserializer};

/// Yahoo writes share classes with a dash; index lists use a dot, e.g.,
/// `BRK.B` -> `BRK-B`
pub fn yahoo_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase().replace('.', "-")
}

/// Transform `unix timestamps` -> `naive dates`, e.g.,
/// `1705795200` -> `2024-01-21`
pub fn de_timestamps_to_naive_date<'de, D>(deserializer: D) -> Result<Vec<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let timestamps: Vec<i64> = Deserialize::deserialize(deserializer)?;
    timestamps
        .into_iter()
        .map(|timestamp| {
            DateTime::from_timestamp(timestamp, 0)
                .map(|dt| dt.date_naive())
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {timestamp}")))
        })
        .collect()
}

/// Numeric cell in Yahoo's `{ "raw": 1.0, "fmt": "1.00" }` shape; `{}` when missing.
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct Raw {
    #[serde(default)]
    pub raw: Option<f64>,
}

pub fn raw(cell: &Option<Raw>) -> Option<f64> {
    cell.and_then(|c| c.raw)
}

/// Map a transport error, keeping timeouts distinguishable.
pub fn http_error(symbol: &str, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout {
            symbol: symbol.to_string(),
        }
    } else {
        Error::provider(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Stamps {
        #[serde(deserialize_with = "de_timestamps_to_naive_date")]
        timestamp: Vec<NaiveDate>,
    }

    #[test]
    fn timestamps_become_dates() {
        let stamps: Stamps = serde_json::from_str(r#"{ "timestamp": [1704205800, 1704292200] }"#).unwrap();
        assert_eq!(
            stamps.timestamp,
            vec![
                NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()
            ]
        );
    }

    #[test]
    fn share_classes_use_dashes() {
        assert_eq!(yahoo_symbol("BRK.B"), "BRK-B");
        assert_eq!(yahoo_symbol(" aapl "), "AAPL");
    }

    #[test]
    fn raw_cells_tolerate_empty_objects() {
        let cells: Vec<Option<Raw>> = serde_json::from_str(r#"[{ "raw": 2.5, "fmt": "2.50" }, {}, null]"#).unwrap();
        assert_eq!(raw(&cells[0]), Some(2.5));
        assert_eq!(raw(&cells[1]), None);
        assert_eq!(raw(&cells[2]), None);
    }
}
