use crate::error::{Error, Result};
use crate::returns::ReturnSample;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::{IntoParallelIterator, ParallelIterator};
use serde::Serialize;
use tracing::{debug, trace};

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Historical bootstrap: every step multiplies the previous price by (1 + r), with r drawn
// uniformly, with replacement, from the empirical return sample.
//
////////////////////////////////////////////////////////////////////////////////////////////////////

/// One simulated price path; `prices[0]` is the starting price.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SimulatedPath(Vec<f64>);

impl SimulatedPath {
    pub fn prices(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Final price; `None` only for a path built empty by hand.
    pub fn terminal(&self) -> Option<f64> {
        self.0.last().copied()
    }
}

impl From<Vec<f64>> for SimulatedPath {
    fn from(prices: Vec<f64>) -> Self {
        SimulatedPath(prices)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SimulationBatch {
    pub start_price: f64,
    pub horizon: usize,
    pub paths: Vec<SimulatedPath>,
}

impl SimulationBatch {
    pub fn terminal_prices(&self) -> Vec<f64> {
        self.paths.iter().filter_map(SimulatedPath::terminal).collect()
    }

    /// `None` when no path has a final price.
    pub fn terminal_summary(&self) -> Option<TerminalSummary> {
        let mut terminal = self.terminal_prices();
        if terminal.is_empty() {
            return None;
        }
        terminal.sort_by(f64::total_cmp);
        let n = terminal.len() as f64;
        Some(TerminalSummary {
            min: terminal[0],
            p5: percentile(&terminal, 0.05),
            p25: percentile(&terminal, 0.25),
            median: percentile(&terminal, 0.50),
            p75: percentile(&terminal, 0.75),
            p95: percentile(&terminal, 0.95),
            max: terminal[terminal.len() - 1],
            mean: terminal.iter().sum::<f64>() / n,
            prob_below_start: terminal.iter().filter(|p| **p < self.start_price).count() as f64
                / n,
        })
    }
}

/// Distribution of final prices across a batch.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TerminalSummary {
    pub min: f64,
    pub p5: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub p95: f64,
    pub max: f64,
    pub mean: f64,
    pub prob_below_start: f64,
}

// linear interpolation between closest ranks; `sorted` must be non-empty
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = p * (sorted.len() - 1) as f64;
    let (lo, hi) = (rank.floor() as usize, rank.ceil() as usize);
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

fn validate(sample: &ReturnSample, start_price: f64, horizon: usize, count: usize) -> Result<()> {
    if sample.is_empty() {
        return Err(Error::InsufficientData {
            needed: 1,
            found: 0,
        });
    }
    if horizon == 0 {
        return Err(Error::InvalidParameter(
            "time horizon must be a positive number of trading days".to_string(),
        ));
    }
    if count == 0 {
        return Err(Error::InvalidParameter(
            "number of simulations must be positive".to_string(),
        ));
    }
    if !start_price.is_finite() || start_price <= 0.0 {
        return Err(Error::InvalidParameter(format!(
            "starting price must be finite and positive, got {start_price}"
        )));
    }
    Ok(())
}

fn simulate_path<R: Rng + ?Sized>(
    returns: &[f64],
    start_price: f64,
    horizon: usize,
    rng: &mut R,
) -> SimulatedPath {
    let mut prices = Vec::with_capacity(horizon);
    prices.push(start_price);
    for _ in 1..horizon {
        let prev = prices[prices.len() - 1];
        let r = returns[rng.gen_range(0..returns.len())];
        prices.push(prev * (1.0 + r));
    }
    SimulatedPath(prices)
}

/// Generate `count` bootstrap paths of `horizon` prices each, drawing from `rng`.
///
/// Paths are generated one after another from the same source, so a seeded
/// generator reproduces the batch exactly.
pub fn simulate_paths<R: Rng + ?Sized>(
    sample: &ReturnSample,
    start_price: f64,
    horizon: usize,
    count: usize,
    rng: &mut R,
) -> Result<SimulationBatch> {
    validate(sample, start_price, horizon, count)?;
    let returns = sample.as_slice();
    let paths = (0..count)
        .map(|_| simulate_path(returns, start_price, horizon, rng))
        .collect();

    Ok(SimulationBatch {
        start_price,
        horizon,
        paths,
    })
}

/// Parallel runner; each path owns a generator derived from `(seed, path index)`,
/// so a seeded run is identical however rayon schedules it.
///
/// ```ignore
/// let batch = MonteCarlo { simulations: 500, horizon: 60, seed: Some(7) }
///     .run(&sample, last_close)?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonteCarlo {
    pub simulations: usize,
    pub horizon: usize,
    pub seed: Option<u64>,
}

impl Default for MonteCarlo {
    fn default() -> Self {
        Self {
            simulations: 200,
            horizon: 30,
            seed: None,
        }
    }
}

impl MonteCarlo {
    pub fn run(&self, sample: &ReturnSample, start_price: f64) -> Result<SimulationBatch> {
        validate(sample, start_price, self.horizon, self.simulations)?;
        let time = std::time::Instant::now();
        let base_seed = self.seed.unwrap_or_else(|| rand::thread_rng().gen());
        trace!("running Monte Carlo with base seed {base_seed}");

        let returns = sample.as_slice();
        let paths: Vec<SimulatedPath> = (0..self.simulations)
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(path_seed(base_seed, i));
                simulate_path(returns, start_price, self.horizon, &mut rng)
            })
            .collect();

        debug!(
            "{} paths x {} days simulated. Elapsed time: {} ms",
            self.simulations,
            self.horizon,
            time.elapsed().as_millis()
        );

        Ok(SimulationBatch {
            start_price,
            horizon: self.horizon,
            paths,
        })
    }
}

fn path_seed(base: u64, index: usize) -> u64 {
    base.wrapping_add((index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}
