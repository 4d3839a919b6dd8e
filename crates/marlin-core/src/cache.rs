use crate::error::Result;
use crate::gateway::{Constituent, FinancialStatements, MarketData, Period, Profile};
use crate::series::PriceSeries;
use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, trace};

/// What was fetched for a symbol; half of the cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchKind {
    Profile,
    PriceHistory(Period),
    Financials,
    SharesOutstanding,
}

#[derive(Debug, Clone)]
enum Entry {
    Profile(Profile),
    PriceHistory(PriceSeries),
    Financials(FinancialStatements),
    SharesOutstanding(Option<f64>),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Session-scoped memoization in front of a [`MarketData`] provider.
///
/// Entries live until [`refresh`](SessionCache::refresh) or
/// [`refresh_all`](SessionCache::refresh_all); there is no expiry and no eviction.
/// Failed fetches are not stored.
///
/// ```ignore
/// let session = SessionCache::new(YahooFinance::from_env()?);
/// let history = session.price_history("AAPL", Period::FiveYears).await?; // fetched
/// let history = session.price_history("AAPL", Period::FiveYears).await?; // cached
/// session.refresh("AAPL").await;
/// ```
pub struct SessionCache<G> {
    inner: G,
    entries: Mutex<HashMap<(String, FetchKind), Entry>>,
    constituents: Mutex<Option<Vec<Constituent>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<G: MarketData> SessionCache<G> {
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            entries: Mutex::new(HashMap::new()),
            constituents: Mutex::new(None),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Drop everything held for `symbol`; the next read fetches again.
    pub async fn refresh(&self, symbol: &str) {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|(cached, _), _| cached != symbol);
        debug!("[{symbol}] refreshed, {} entries dropped", before - entries.len());
    }

    /// Drop every entry, index constituents included.
    pub async fn refresh_all(&self) {
        self.entries.lock().await.clear();
        *self.constituents.lock().await = None;
        debug!("session cache cleared");
    }

    async fn memoize<T, F, Fut>(
        &self,
        symbol: &str,
        kind: FetchKind,
        fetch: F,
        wrap: fn(T) -> Entry,
        unwrap: fn(Entry) -> Option<T>,
    ) -> Result<T>
    where
        T: Clone + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send,
    {
        let key = (symbol.to_string(), kind);
        let cached = self.entries.lock().await.get(&key).cloned();
        if let Some(value) = cached.and_then(unwrap) {
            trace!("[{symbol}] cache hit: {kind:?}");
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(value);
        }

        trace!("[{symbol}] cache miss: {kind:?}");
        self.misses.fetch_add(1, Ordering::Relaxed);
        let value = fetch().await?;
        self.entries.lock().await.insert(key, wrap(value.clone()));
        Ok(value)
    }
}

#[async_trait]
impl<G: MarketData> MarketData for SessionCache<G> {
    async fn constituents(&self) -> Result<Vec<Constituent>> {
        let cached = self.constituents.lock().await.clone();
        if let Some(list) = cached {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(list);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let list = self.inner.constituents().await?;
        *self.constituents.lock().await = Some(list.clone());
        Ok(list)
    }

    async fn profile(&self, symbol: &str) -> Result<Profile> {
        self.memoize(
            symbol,
            FetchKind::Profile,
            || self.inner.profile(symbol),
            Entry::Profile,
            |entry| match entry {
                Entry::Profile(p) => Some(p),
                _ => None,
            },
        )
        .await
    }

    async fn price_history(&self, symbol: &str, period: Period) -> Result<PriceSeries> {
        self.memoize(
            symbol,
            FetchKind::PriceHistory(period),
            || self.inner.price_history(symbol, period),
            Entry::PriceHistory,
            |entry| match entry {
                Entry::PriceHistory(s) => Some(s),
                _ => None,
            },
        )
        .await
    }

    async fn financial_statements(&self, symbol: &str) -> Result<FinancialStatements> {
        self.memoize(
            symbol,
            FetchKind::Financials,
            || self.inner.financial_statements(symbol),
            Entry::Financials,
            |entry| match entry {
                Entry::Financials(f) => Some(f),
                _ => None,
            },
        )
        .await
    }

    async fn shares_outstanding(&self, symbol: &str) -> Result<Option<f64>> {
        self.memoize(
            symbol,
            FetchKind::SharesOutstanding,
            || self.inner.shares_outstanding(symbol),
            Entry::SharesOutstanding,
            |entry| match entry {
                Entry::SharesOutstanding(s) => Some(s),
                _ => None,
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::series::tests::series;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct CountingMarket {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingMarket {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn hit(&self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::provider("provider down"));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl MarketData for CountingMarket {
        async fn constituents(&self) -> Result<Vec<Constituent>> {
            self.hit()?;
            Ok(vec![])
        }

        async fn profile(&self, symbol: &str) -> Result<Profile> {
            self.hit()?;
            Ok(Profile {
                symbol: symbol.to_string(),
                ..Profile::default()
            })
        }

        async fn price_history(&self, _symbol: &str, _period: Period) -> Result<PriceSeries> {
            self.hit()?;
            Ok(series(&[1.0, 2.0, 3.0]))
        }

        async fn financial_statements(&self, _symbol: &str) -> Result<FinancialStatements> {
            self.hit()?;
            Ok(FinancialStatements::default())
        }

        async fn shares_outstanding(&self, _symbol: &str) -> Result<Option<f64>> {
            self.hit()?;
            Ok(None)
        }
    }

    #[tokio::test]
    async fn second_read_is_served_from_cache() {
        let cache = SessionCache::new(CountingMarket::default());
        let first = cache.price_history("AAPL", Period::FiveYears).await.unwrap();
        let second = cache.price_history("AAPL", Period::FiveYears).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.inner().calls(), 1);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });

        // absent shares are a value worth remembering too
        assert_eq!(cache.shares_outstanding("AAPL").await.unwrap(), None);
        assert_eq!(cache.shares_outstanding("AAPL").await.unwrap(), None);
        assert_eq!(cache.inner().calls(), 2);
    }

    #[tokio::test]
    async fn keys_include_fetch_kind_and_period() {
        let cache = SessionCache::new(CountingMarket::default());
        cache.price_history("MSFT", Period::OneYear).await.unwrap();
        cache.price_history("MSFT", Period::FiveYears).await.unwrap();
        cache.profile("MSFT").await.unwrap();
        cache.financial_statements("MSFT").await.unwrap();
        assert_eq!(cache.inner().calls(), 4);
    }

    #[tokio::test]
    async fn refresh_forces_a_refetch_for_one_symbol() {
        let cache = SessionCache::new(CountingMarket::default());
        cache.profile("AAPL").await.unwrap();
        cache.profile("NVDA").await.unwrap();
        cache.refresh("AAPL").await;
        cache.profile("AAPL").await.unwrap();
        cache.profile("NVDA").await.unwrap();
        assert_eq!(cache.inner().calls(), 3);

        cache.constituents().await.unwrap();
        cache.refresh_all().await;
        cache.constituents().await.unwrap();
        cache.profile("NVDA").await.unwrap();
        assert_eq!(cache.inner().calls(), 6);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let cache = SessionCache::new(CountingMarket {
            fail: true,
            ..CountingMarket::default()
        });
        assert!(cache.profile("AAPL").await.is_err());
        assert!(cache.profile("AAPL").await.is_err());
        assert_eq!(cache.inner().calls(), 2);
    }
}
