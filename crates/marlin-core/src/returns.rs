use crate::error::{Error, Result};
use crate::series::PriceSeries;
use serde::Serialize;

/// Empirical daily returns; never empty once built.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ReturnSample(Vec<f64>);

impl ReturnSample {
    /// Build a sample from raw returns, e.g. a previously exported distribution.
    pub fn new(returns: Vec<f64>) -> Result<Self> {
        if returns.is_empty() {
            return Err(Error::InsufficientData {
                needed: 1,
                found: 0,
            });
        }
        if let Some(bad) = returns.iter().find(|r| !r.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "return sample contains a non-finite value: {bad}"
            )));
        }
        Ok(ReturnSample(returns))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Percentage change between consecutive closes; the leading (undefined) change is dropped.
pub fn sample_returns(series: &PriceSeries) -> Result<ReturnSample> {
    if series.len() < 2 {
        return Err(Error::InsufficientData {
            needed: 2,
            found: series.len(),
        });
    }

    let closes: Vec<f64> = series.closes().collect();
    let returns = closes
        .windows(2)
        .map(|pair| {
            let (prev, next) = (pair[0], pair[1]);
            if prev == 0.0 || !prev.is_finite() || !next.is_finite() {
                return Err(Error::InvalidParameter(format!(
                    "undefined return between closes {prev} and {next}"
                )));
            }
            Ok(next / prev - 1.0)
        })
        .collect::<Result<Vec<f64>>>()?;

    ReturnSample::new(returns)
}
