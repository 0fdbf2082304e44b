use chrono::NaiveDate;
use flickbook_core::metadata::{MovieDetails, MovieMetadataProvider, UNKNOWN};
use flickbook_core::repository::{MovieRepository, RepoResult};
use flickbook_shared::Movie;
use serde::Serialize;
use tracing::warn;

/// A catalog movie merged with provider metadata.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CatalogEntry {
    pub imdb_id: String,
    pub title: String,
    pub year: String,
    pub poster: String,
    pub expiration: Option<NaiveDate>,
    pub genre: String,
    pub director: String,
    pub rating: String,
    pub plot: String,
}

/// Merge `movie` with its metadata. Stored title, year and poster win over
/// the provider's; an unreachable provider yields "N/A" fields.
pub async fn enrich(movie: &Movie, provider: &dyn MovieMetadataProvider) -> CatalogEntry {
    let details = match provider.movie_details(&movie.imdb_id).await {
        Ok(details) => details,
        Err(e) => {
            warn!("Metadata unavailable for {}: {}", movie.imdb_id, e);
            MovieDetails::fallback(&movie.imdb_id, &movie.title)
        }
    };

    CatalogEntry {
        imdb_id: movie.imdb_id.clone(),
        title: movie.title.clone(),
        year: movie.year.clone().unwrap_or(details.year),
        poster: movie.poster.clone().unwrap_or(details.poster),
        expiration: movie.expiration,
        genre: details.genre,
        director: details.director,
        rating: details.rating,
        plot: details.plot,
    }
}

/// The whole catalog, enriched, in store order.
pub async fn catalog(
    movies: &dyn MovieRepository,
    provider: &dyn MovieMetadataProvider,
) -> RepoResult<Vec<CatalogEntry>> {
    let mut entries = Vec::new();
    for movie in movies.list_movies().await? {
        entries.push(enrich(&movie, provider).await);
    }
    Ok(entries)
}

pub fn is_unknown(value: &str) -> bool {
    value == UNKNOWN
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use flickbook_core::metadata::{MetadataError, SearchHit};
    use flickbook_shared::NewMovie;
    use flickbook_store::MemoryStore;

    struct DownProvider;

    #[async_trait]
    impl MovieMetadataProvider for DownProvider {
        async fn movie_details(&self, _imdb_id: &str) -> Result<MovieDetails, MetadataError> {
            Err(MetadataError::Request("connection refused".to_string()))
        }

        async fn search(&self, _term: &str) -> Result<Vec<SearchHit>, MetadataError> {
            Err(MetadataError::Request("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_provider_failure_degrades() {
        let store = MemoryStore::new();
        store
            .add_movie(&NewMovie {
                imdb_id: "tt0110912".to_string(),
                title: "Pulp Fiction".to_string(),
                year: Some("1994".to_string()),
                poster: None,
                expiration: None,
            })
            .await
            .unwrap();

        let entries = catalog(&store, &DownProvider).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Pulp Fiction");
        assert_eq!(entries[0].year, "1994");
        assert!(is_unknown(&entries[0].poster));
        assert!(is_unknown(&entries[0].genre));
    }
}
