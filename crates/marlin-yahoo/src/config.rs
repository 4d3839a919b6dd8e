use dotenv::var;
use marlin_core::{Error, Result};
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; marlin/0.1)";
pub const DEFAULT_CONSTITUENTS_URL: &str =
    "https://raw.githubusercontent.com/datasets/s-and-p-500-companies/main/data/constituents.csv";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Provider settings, read from the environment (and `.env`, when present):
///
/// | variable                  | default                    |
/// |---------------------------|----------------------------|
/// | `USER_AGENT`              | [`DEFAULT_USER_AGENT`]     |
/// | `MARLIN_TIMEOUT_SECS`     | 30                         |
/// | `MARLIN_CONCURRENCY`      | number of CPUs             |
/// | `MARLIN_CONSTITUENTS_URL` | datahub S&P 500 CSV        |
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub user_agent: String,
    pub timeout: Duration,
    pub concurrency: usize,
    pub constituents_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            concurrency: num_cpus::get(),
            constituents_url: DEFAULT_CONSTITUENTS_URL.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| var(key).ok())
    }

    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self> {
        let defaults = Config::default();
        let timeout = match lookup("MARLIN_TIMEOUT_SECS") {
            Some(secs) => Duration::from_secs(parse_positive("MARLIN_TIMEOUT_SECS", &secs)?),
            None => defaults.timeout,
        };
        let concurrency = match lookup("MARLIN_CONCURRENCY") {
            Some(n) => parse_positive("MARLIN_CONCURRENCY", &n)? as usize,
            None => defaults.concurrency,
        };

        Ok(Config {
            user_agent: lookup("USER_AGENT").unwrap_or(defaults.user_agent),
            timeout,
            concurrency,
            constituents_url: lookup("MARLIN_CONSTITUENTS_URL").unwrap_or(defaults.constituents_url),
        })
    }
}

fn parse_positive(key: &str, value: &str) -> Result<u64> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(Error::InvalidParameter(format!(
            "{key} must be a positive integer, got \"{value}\""
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("USER_AGENT", "me@example.com"),
            ("MARLIN_TIMEOUT_SECS", "5"),
            ("MARLIN_CONCURRENCY", "4"),
        ]))
        .unwrap();
        assert_eq!(config.user_agent, "me@example.com");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.concurrency, 4);
    }

    #[test]
    fn rejects_zero_and_garbage() {
        assert!(Config::from_lookup(lookup(&[("MARLIN_TIMEOUT_SECS", "0")])).is_err());
        assert!(Config::from_lookup(lookup(&[("MARLIN_CONCURRENCY", "many")])).is_err());
    }
}
