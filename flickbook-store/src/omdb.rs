use async_trait::async_trait;
use flickbook_core::metadata::{MetadataError, MovieDetails, MovieMetadataProvider, SearchHit, UNKNOWN};
use serde::Deserialize;

use crate::app_config::MetadataConfig;

/// OMDb-backed metadata provider.
///
/// Requests are sent without a client timeout; a slow provider holds the
/// calling request for as long as it takes.
pub struct OmdbClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct OmdbMovie {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Error")]
    error: Option<String>,
    #[serde(rename = "imdbID")]
    imdb_id: Option<String>,
    #[serde(rename = "Title")]
    title: Option<String>,
    #[serde(rename = "Year")]
    year: Option<String>,
    #[serde(rename = "Poster")]
    poster: Option<String>,
    #[serde(rename = "Genre")]
    genre: Option<String>,
    #[serde(rename = "Director")]
    director: Option<String>,
    #[serde(rename = "Actors")]
    actors: Option<String>,
    #[serde(rename = "imdbRating")]
    rating: Option<String>,
    #[serde(rename = "Plot")]
    plot: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OmdbSearch {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Search", default)]
    search: Vec<OmdbHit>,
}

#[derive(Debug, Deserialize)]
struct OmdbHit {
    #[serde(rename = "imdbID")]
    imdb_id: String,
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Year", default)]
    year: String,
    #[serde(rename = "Poster", default)]
    poster: String,
}

fn or_unknown(value: Option<String>) -> String {
    value.unwrap_or_else(|| UNKNOWN.to_string())
}

impl OmdbClient {
    pub fn new(config: &MetadataConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn details_from(imdb_id: &str, movie: OmdbMovie) -> Result<MovieDetails, MetadataError> {
        if movie.response != "True" {
            return Err(MetadataError::NotFound(
                movie.error.unwrap_or_else(|| imdb_id.to_string()),
            ));
        }

        Ok(MovieDetails {
            imdb_id: movie.imdb_id.unwrap_or_else(|| imdb_id.to_string()),
            title: or_unknown(movie.title),
            year: or_unknown(movie.year),
            poster: or_unknown(movie.poster),
            genre: or_unknown(movie.genre),
            director: or_unknown(movie.director),
            actors: or_unknown(movie.actors),
            rating: or_unknown(movie.rating),
            plot: or_unknown(movie.plot),
        })
    }
}

#[async_trait]
impl MovieMetadataProvider for OmdbClient {
    async fn movie_details(&self, imdb_id: &str) -> Result<MovieDetails, MetadataError> {
        let movie: OmdbMovie = self
            .http
            .get(&self.base_url)
            .query(&[("apikey", self.api_key.as_str()), ("i", imdb_id), ("plot", "short")])
            .send()
            .await
            .map_err(|e| MetadataError::Request(e.to_string()))?
            .json()
            .await
            .map_err(|e| MetadataError::Malformed(e.to_string()))?;

        Self::details_from(imdb_id, movie)
    }

    async fn search(&self, term: &str) -> Result<Vec<SearchHit>, MetadataError> {
        let found: OmdbSearch = self
            .http
            .get(&self.base_url)
            .query(&[("apikey", self.api_key.as_str()), ("s", term), ("type", "movie")])
            .send()
            .await
            .map_err(|e| MetadataError::Request(e.to_string()))?
            .json()
            .await
            .map_err(|e| MetadataError::Malformed(e.to_string()))?;

        // "Movie not found!" comes back as Response=False
        if found.response != "True" {
            return Ok(Vec::new());
        }

        Ok(found
            .search
            .into_iter()
            .map(|hit| SearchHit {
                imdb_id: hit.imdb_id,
                title: hit.title,
                year: hit.year,
                poster: hit.poster,
            })
            .collect())
    }
}
