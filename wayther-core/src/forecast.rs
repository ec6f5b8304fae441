//! Cache-first forecast lookup.

use anyhow::Result;
use chrono::Duration;
use tracing::{debug, warn};

use crate::{cache::Cache, model::ForecastResponse, provider::WeatherProvider};

/// Looks a location up in the cache first and only calls the provider on a
/// miss or a stale entry.
///
/// Cache problems never fail a lookup: they are logged and the fresh response
/// is returned anyway.
#[derive(Debug)]
pub struct CachedForecast<P> {
    provider: P,
    cache: Option<Cache<ForecastResponse>>,
    max_age: Duration,
}

impl<P: WeatherProvider> CachedForecast<P> {
    pub fn new(provider: P, cache: Option<Cache<ForecastResponse>>, max_age: Duration) -> Self {
        Self { provider, cache, max_age }
    }

    pub async fn fetch(&mut self, location: &str) -> Result<ForecastResponse> {
        if let Some(entry) = self.cache.as_ref().and_then(|cache| cache.get(location)) {
            if !entry.is_stale(self.max_age) {
                debug!(%location, cached_at = %entry.timestamp, "using cached forecast");
                return Ok(entry.weather.clone());
            }
            debug!(%location, "cached forecast is stale");
        }

        let response = self.provider.forecast(location).await?;

        if let Some(cache) = self.cache.as_mut()
            && let Err(err) = cache.set(location, response.clone())
        {
            warn!(path = %cache.path().display(), "failed to write forecast cache: {err}");
        }

        Ok(response)
    }

    /// Drop cached responses older than the max age.
    pub fn clean(&mut self) -> Result<()> {
        if let Some(cache) = self.cache.as_mut() {
            cache.clean(self.max_age)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };
    use tempfile::TempDir;

    #[derive(Debug, Default, Clone)]
    struct CountingProvider {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl WeatherProvider for CountingProvider {
        async fn forecast(&self, location: &str) -> Result<ForecastResponse> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            let mut response = ForecastResponse::default();
            response.location.name = location.to_string();
            response.current.temp_c = n as f64;
            Ok(response)
        }
    }

    #[derive(Debug)]
    struct FailingProvider;

    #[async_trait]
    impl WeatherProvider for FailingProvider {
        async fn forecast(&self, _location: &str) -> Result<ForecastResponse> {
            Err(anyhow::anyhow!("upstream down"))
        }
    }

    fn open_cache(dir: &TempDir) -> Cache<ForecastResponse> {
        Cache::new(dir.path().join("config.toml")).expect("cache")
    }

    #[tokio::test]
    async fn second_lookup_is_served_from_cache() {
        let dir = TempDir::new().expect("temp dir");
        let provider = CountingProvider::default();
        let calls = Arc::clone(&provider.calls);
        let mut forecast =
            CachedForecast::new(provider, Some(open_cache(&dir)), Duration::minutes(30));

        let first = forecast.fetch("Paris").await.expect("first fetch");
        let second = forecast.fetch("Paris").await.expect("second fetch");

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn cache_is_shared_across_processes_via_file() {
        let dir = TempDir::new().expect("temp dir");
        let provider = CountingProvider::default();
        let calls = Arc::clone(&provider.calls);

        let mut first = CachedForecast::new(
            provider.clone(),
            Some(open_cache(&dir)),
            Duration::minutes(30),
        );
        first.fetch("Oslo").await.expect("fetch");

        let mut second = CachedForecast::new(provider, Some(open_cache(&dir)), Duration::minutes(30));
        let response = second.fetch("Oslo").await.expect("fetch");

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(response.location.name, "Oslo");
    }

    #[tokio::test]
    async fn stale_entry_is_refetched() {
        let dir = TempDir::new().expect("temp dir");
        let provider = CountingProvider::default();
        let calls = Arc::clone(&provider.calls);
        // A negative max age makes every entry stale immediately.
        let mut forecast =
            CachedForecast::new(provider, Some(open_cache(&dir)), Duration::seconds(-1));

        forecast.fetch("Rome").await.expect("first fetch");
        let second = forecast.fetch("Rome").await.expect("second fetch");

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(second.current.temp_c, 2.0);
    }

    #[tokio::test]
    async fn clean_drops_stale_entries_from_disk() {
        let dir = TempDir::new().expect("temp dir");
        let mut cache = open_cache(&dir);
        cache.set("Oslo", ForecastResponse::default()).expect("seed cache");

        // Rewrite the stored timestamp so the entry is two hours old.
        let path = dir.path().join("cache.json");
        let mut raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("json");
        let old = chrono::Utc::now() - Duration::hours(2);
        raw["Oslo"]["timestamp"] = serde_json::Value::String(old.to_rfc3339());
        std::fs::write(&path, raw.to_string()).expect("write");

        let mut forecast = CachedForecast::new(
            CountingProvider::default(),
            Some(open_cache(&dir)),
            Duration::hours(1),
        );
        forecast.clean().expect("clean");

        assert!(open_cache(&dir).get("Oslo").is_none());
    }

    #[tokio::test]
    async fn works_without_cache() {
        let provider = CountingProvider::default();
        let calls = Arc::clone(&provider.calls);
        let mut forecast = CachedForecast::new(provider, None, Duration::minutes(30));

        forecast.fetch("Ghent").await.expect("fetch");
        forecast.fetch("Ghent").await.expect("fetch");
        forecast.clean().expect("clean without cache");

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn provider_errors_propagate() {
        let dir = TempDir::new().expect("temp dir");
        let mut forecast =
            CachedForecast::new(FailingProvider, Some(open_cache(&dir)), Duration::minutes(30));

        let err = forecast.fetch("Paris").await.unwrap_err();
        assert_eq!(err.to_string(), "upstream down");
    }

    #[tokio::test]
    async fn cache_write_failure_still_returns_response() {
        let dir = TempDir::new().expect("temp dir");
        let cache = open_cache(&dir);
        std::fs::create_dir(dir.path().join("cache.json")).expect("block cache file");
        let mut forecast =
            CachedForecast::new(CountingProvider::default(), Some(cache), Duration::minutes(30));

        let response = forecast.fetch("Paris").await.expect("fetch despite cache error");
        assert_eq!(response.location.name, "Paris");
    }
}
