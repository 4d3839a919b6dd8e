/// Market data provider seam, plus the data it hands back (profiles, statements, index members).
pub mod gateway;

/// Daily OHLCV history.
pub mod series;

/// Empirical daily returns from a price history.
pub mod returns;

/// Bootstrap Monte Carlo price paths.
pub mod simulate;

/// Ranking a universe of symbols by market cap change.
pub mod scan;

/// Session-scoped memoization of provider calls.
pub mod cache;

/// Preset chart durations (1M, 3M, ..., MAX).
pub mod window;

/// Price/volume chart points.
pub mod chart;

pub mod error;

pub use cache::SessionCache;
pub use error::{Error, Result};
pub use gateway::MarketData;
pub use returns::{sample_returns, ReturnSample};
pub use scan::{rank_by_market_cap_change, Ranking, RankingEntry, ScanOptions, ScanReport};
pub use series::{PriceBar, PriceSeries};
pub use simulate::{simulate_paths, MonteCarlo, SimulatedPath, SimulationBatch};
