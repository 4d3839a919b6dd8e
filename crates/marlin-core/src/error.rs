use thiserror::Error;

/// Failures surfaced by the core computations and by [`MarketData`] providers.
///
/// [`MarketData`]: crate::gateway::MarketData
#[derive(Error, Debug)]
pub enum Error {
    /// Not enough historical observations to proceed.
    #[error("insufficient data: needed {needed} observations, found {found}")]
    InsufficientData { needed: usize, found: usize },

    /// A caller-supplied parameter is out of range (e.g. a zero horizon).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The provider could not supply a required field for a single entity.
    #[error("[{symbol}] data unavailable: {field}")]
    DataUnavailable { symbol: String, field: &'static str },

    /// A provider call outlived its deadline.
    #[error("[{symbol}] timed out")]
    Timeout { symbol: String },

    /// Transport or decoding failure inside a provider.
    #[error("provider error: {0}")]
    Provider(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wrap any transport/decoding error, e.g. `.map_err(Error::provider)?`.
    pub fn provider<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::Provider(err.into())
    }

    pub fn unavailable(symbol: impl Into<String>, field: &'static str) -> Self {
        Error::DataUnavailable {
            symbol: symbol.into(),
            field,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
