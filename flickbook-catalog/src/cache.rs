use async_trait::async_trait;
use flickbook_core::metadata::{MetadataError, MovieDetails, MovieMetadataProvider, SearchHit};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Per-id TTL cache in front of a metadata provider.
///
/// Only successful lookups are cached. Searches always go to the provider.
pub struct MetadataCache {
    inner: Arc<dyn MovieMetadataProvider>,
    ttl: Duration,
    entries: RwLock<HashMap<String, (Instant, MovieDetails)>>,
}

impl MetadataCache {
    pub fn new(inner: Arc<dyn MovieMetadataProvider>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    async fn cached(&self, imdb_id: &str) -> Option<MovieDetails> {
        let entries = self.entries.read().await;
        entries
            .get(imdb_id)
            .filter(|(stored_at, _)| stored_at.elapsed() < self.ttl)
            .map(|(_, details)| details.clone())
    }
}

#[async_trait]
impl MovieMetadataProvider for MetadataCache {
    async fn movie_details(&self, imdb_id: &str) -> Result<MovieDetails, MetadataError> {
        if let Some(details) = self.cached(imdb_id).await {
            debug!("metadata cache hit for {}", imdb_id);
            return Ok(details);
        }

        let details = self.inner.movie_details(imdb_id).await?;
        let mut entries = self.entries.write().await;
        entries.retain(|_, (stored_at, _)| stored_at.elapsed() < self.ttl);
        entries.insert(imdb_id.to_string(), (Instant::now(), details.clone()));
        Ok(details)
    }

    async fn search(&self, term: &str) -> Result<Vec<SearchHit>, MetadataError> {
        self.inner.search(term).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MovieMetadataProvider for CountingProvider {
        async fn movie_details(&self, imdb_id: &str) -> Result<MovieDetails, MetadataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if imdb_id == "tt_missing" {
                return Err(MetadataError::NotFound(imdb_id.to_string()));
            }
            Ok(MovieDetails::fallback(imdb_id, "Cached"))
        }

        async fn search(&self, _term: &str) -> Result<Vec<SearchHit>, MetadataError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_hits_within_ttl() {
        let provider = Arc::new(CountingProvider::default());
        let cache = MetadataCache::new(provider.clone(), Duration::from_secs(60));

        cache.movie_details("tt1").await.unwrap();
        cache.movie_details("tt1").await.unwrap();
        cache.movie_details("tt2").await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_zero_ttl_always_refetches() {
        let provider = Arc::new(CountingProvider::default());
        let cache = MetadataCache::new(provider.clone(), Duration::ZERO);

        cache.movie_details("tt1").await.unwrap();
        cache.movie_details("tt1").await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_stale_entries_swept_on_write() {
        let provider = Arc::new(CountingProvider::default());
        let cache = MetadataCache::new(provider.clone(), Duration::ZERO);

        cache.movie_details("tt1").await.unwrap();
        cache.movie_details("tt2").await.unwrap();
        cache.movie_details("tt3").await.unwrap();

        let entries = cache.entries.read().await;
        assert_eq!(entries.len(), 1);
        assert!(entries.contains_key("tt3"));
    }

    #[tokio::test]
    async fn test_failures_not_cached() {
        let provider = Arc::new(CountingProvider::default());
        let cache = MetadataCache::new(provider.clone(), Duration::from_secs(60));

        assert!(cache.movie_details("tt_missing").await.is_err());
        assert!(cache.movie_details("tt_missing").await.is_err());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }
}
