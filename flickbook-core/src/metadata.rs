use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Placeholder used whenever the provider cannot supply a field.
pub const UNKNOWN: &str = "N/A";

/// Descriptive data about a movie from the external metadata provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieDetails {
    pub imdb_id: String,
    pub title: String,
    pub year: String,
    pub poster: String,
    pub genre: String,
    pub director: String,
    pub actors: String,
    pub rating: String,
    pub plot: String,
}

impl MovieDetails {
    /// Details to show when the provider is unreachable or does not know the id.
    pub fn fallback(imdb_id: &str, title: &str) -> Self {
        Self {
            imdb_id: imdb_id.to_string(),
            title: title.to_string(),
            year: UNKNOWN.to_string(),
            poster: UNKNOWN.to_string(),
            genre: UNKNOWN.to_string(),
            director: UNKNOWN.to_string(),
            actors: UNKNOWN.to_string(),
            rating: UNKNOWN.to_string(),
            plot: UNKNOWN.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub imdb_id: String,
    pub title: String,
    pub year: String,
    pub poster: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("metadata request failed: {0}")]
    Request(String),
    #[error("no metadata for {0}")]
    NotFound(String),
    #[error("unexpected metadata payload: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait MovieMetadataProvider: Send + Sync {
    /// Full details for one external catalog id
    async fn movie_details(&self, imdb_id: &str) -> Result<MovieDetails, MetadataError>;

    /// Title search
    async fn search(&self, term: &str) -> Result<Vec<SearchHit>, MetadataError>;
}
