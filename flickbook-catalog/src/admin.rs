use chrono::NaiveDate;
use flickbook_core::repository::{MovieRepository, RepoError};
use flickbook_shared::{Movie, MovieChanges, NewMovie};
use serde::{de, Deserialize, Deserializer};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// Raw add-movie form as submitted by the admin page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovieSubmission {
    pub imdb_id: Option<String>,
    pub title: Option<String>,
    /// Provider results carry the year as text; forms may send a number.
    #[serde(default, deserialize_with = "year_text")]
    pub year: Option<String>,
    pub poster: Option<String>,
    pub expiration: Option<String>,
}

fn year_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(year)) => Ok(Some(year)),
        Some(Value::Number(year)) => Ok(Some(year.to_string())),
        Some(other) => Err(de::Error::custom(format!("year must be text or a number, got {}", other))),
    }
}

/// Raw update-movie form. Absent fields are left alone; an empty
/// `expiration` clears the date.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovieUpdate {
    pub imdb_id: Option<String>,
    pub title: Option<String>,
    pub expiration: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    Added(Movie),
    /// The external id was already in the catalog; nothing was written.
    AlreadyAdded(Movie),
}

impl AddOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            AddOutcome::Added(_) => "Movie added",
            AddOutcome::AlreadyAdded(_) => "Movie already added",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("imdb_id and title are required")]
    MissingFields,
    #[error("Invalid expiration date")]
    InvalidExpiration(String),
    #[error("Movie not found")]
    NotFound(String),
    #[error("catalog store failure: {0}")]
    Store(#[from] RepoError),
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Parse an optional ISO date; blank means "no date".
pub fn parse_expiration(raw: Option<&str>) -> Result<Option<NaiveDate>, CatalogError> {
    match non_blank(raw) {
        None => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| CatalogError::InvalidExpiration(value.to_string())),
    }
}

/// Admin operations over the movie catalog.
#[derive(Clone)]
pub struct CatalogAdmin {
    movies: Arc<dyn MovieRepository>,
}

impl CatalogAdmin {
    pub fn new(movies: Arc<dyn MovieRepository>) -> Self {
        Self { movies }
    }

    /// Add a movie unless its external id is already present.
    pub async fn add_movie(&self, submission: &MovieSubmission) -> Result<AddOutcome, CatalogError> {
        let (imdb_id, title) = match (
            non_blank(submission.imdb_id.as_deref()),
            non_blank(submission.title.as_deref()),
        ) {
            (Some(imdb_id), Some(title)) => (imdb_id, title),
            _ => return Err(CatalogError::MissingFields),
        };
        let expiration = parse_expiration(submission.expiration.as_deref())?;

        if let Some(existing) = self.movies.find_by_imdb_id(imdb_id).await? {
            return Ok(AddOutcome::AlreadyAdded(existing));
        }

        let inserted = self
            .movies
            .add_movie(&NewMovie {
                imdb_id: imdb_id.to_string(),
                title: title.to_string(),
                year: non_blank(submission.year.as_deref()).map(str::to_string),
                poster: non_blank(submission.poster.as_deref()).map(str::to_string),
                expiration,
            })
            .await;

        // A concurrent add of the same id wins the unique constraint.
        let movie = match inserted {
            Ok(movie) => movie,
            Err(err) => match self.movies.find_by_imdb_id(imdb_id).await? {
                Some(existing) => {
                    warn!("Movie {} was added concurrently: {}", imdb_id, err);
                    return Ok(AddOutcome::AlreadyAdded(existing));
                }
                None => return Err(err.into()),
            },
        };

        info!("Movie added: {} ({})", movie.title, movie.imdb_id);
        Ok(AddOutcome::Added(movie))
    }

    /// Remove a movie by external id. Returns whether anything was removed;
    /// an unknown id is not an error. Bookings for the title are kept.
    pub async fn remove_movie(&self, imdb_id: &str) -> Result<bool, CatalogError> {
        match self.movies.find_by_imdb_id(imdb_id.trim()).await? {
            Some(movie) => {
                self.movies.delete_movie(movie.id).await?;
                info!("Movie removed: {} ({})", movie.title, movie.imdb_id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn update_movie(&self, update: &MovieUpdate) -> Result<Movie, CatalogError> {
        let imdb_id = non_blank(update.imdb_id.as_deref())
            .ok_or_else(|| CatalogError::NotFound(String::new()))?;

        let changes = MovieChanges {
            title: non_blank(update.title.as_deref()).map(str::to_string),
            expiration: match &update.expiration {
                Some(raw) => Some(parse_expiration(Some(raw))?),
                None => None,
            },
        };

        self.movies
            .update_movie(imdb_id, &changes)
            .await?
            .ok_or_else(|| CatalogError::NotFound(imdb_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use flickbook_core::repository::{BookingRepository, RepoResult};
    use flickbook_shared::NewBooking;
    use flickbook_store::MemoryStore;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Misses the first lookup, as if another admin inserted the movie
    /// between the existence check and the insert.
    struct LateWriter {
        store: MemoryStore,
        missed: AtomicBool,
    }

    #[async_trait]
    impl MovieRepository for LateWriter {
        async fn add_movie(&self, movie: &NewMovie) -> RepoResult<Movie> {
            self.store.add_movie(movie).await
        }

        async fn find_by_imdb_id(&self, imdb_id: &str) -> RepoResult<Option<Movie>> {
            if !self.missed.swap(true, Ordering::SeqCst) {
                return Ok(None);
            }
            self.store.find_by_imdb_id(imdb_id).await
        }

        async fn find_by_title(&self, title: &str) -> RepoResult<Option<Movie>> {
            self.store.find_by_title(title).await
        }

        async fn list_movies(&self) -> RepoResult<Vec<Movie>> {
            self.store.list_movies().await
        }

        async fn update_movie(&self, imdb_id: &str, changes: &MovieChanges) -> RepoResult<Option<Movie>> {
            self.store.update_movie(imdb_id, changes).await
        }

        async fn delete_movie(&self, id: i64) -> RepoResult<()> {
            self.store.delete_movie(id).await
        }
    }

    fn submission(imdb_id: &str, title: &str, expiration: Option<&str>) -> MovieSubmission {
        MovieSubmission {
            imdb_id: Some(imdb_id.to_string()),
            title: Some(title.to_string()),
            year: Some("2010".to_string()),
            poster: None,
            expiration: expiration.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_duplicate_add_is_noop() {
        let store = MemoryStore::new();
        let admin = CatalogAdmin::new(Arc::new(store.clone()));

        let first = admin.add_movie(&submission("tt1375666", "Inception", None)).await.unwrap();
        assert_eq!(first.message(), "Movie added");

        let second = admin
            .add_movie(&submission("tt1375666", "Inception (again)", Some("2030-01-01")))
            .await
            .unwrap();
        assert_eq!(second.message(), "Movie already added");
        assert_eq!(store.list_movies().await.unwrap().len(), 1);
        assert_eq!(store.list_movies().await.unwrap()[0].title, "Inception");
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_reports_already_added() {
        let store = MemoryStore::new();
        CatalogAdmin::new(Arc::new(store.clone()))
            .add_movie(&submission("tt1375666", "Inception", None))
            .await
            .unwrap();

        let racing = CatalogAdmin::new(Arc::new(LateWriter {
            store: store.clone(),
            missed: AtomicBool::new(false),
        }));
        let outcome = racing.add_movie(&submission("tt1375666", "Inception", None)).await.unwrap();

        assert_eq!(outcome.message(), "Movie already added");
        assert_eq!(store.list_movies().await.unwrap().len(), 1);
    }

    #[test]
    fn test_year_accepts_text_or_number() {
        let numeric: MovieSubmission =
            serde_json::from_value(json!({"imdb_id": "tt1", "title": "Heat", "year": 1995})).unwrap();
        assert_eq!(numeric.year.as_deref(), Some("1995"));

        let text: MovieSubmission =
            serde_json::from_value(json!({"imdb_id": "tt1", "title": "Heat", "year": "1995"})).unwrap();
        assert_eq!(text.year.as_deref(), Some("1995"));

        let absent: MovieSubmission = serde_json::from_value(json!({"imdb_id": "tt1"})).unwrap();
        assert_eq!(absent.year, None);

        assert!(serde_json::from_value::<MovieSubmission>(json!({"year": [1995]})).is_err());
    }

    #[tokio::test]
    async fn test_add_requires_id_and_title() {
        let admin = CatalogAdmin::new(Arc::new(MemoryStore::new()));
        let err = admin.add_movie(&submission("tt1", "  ", None)).await.unwrap_err();
        assert!(matches!(err, CatalogError::MissingFields));
        assert_eq!(err.to_string(), "imdb_id and title are required");
    }

    #[tokio::test]
    async fn test_bad_expiration_rejected() {
        let admin = CatalogAdmin::new(Arc::new(MemoryStore::new()));
        let err = admin
            .add_movie(&submission("tt1", "Heat", Some("next tuesday")))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidExpiration(_)));
    }

    #[tokio::test]
    async fn test_blank_expiration_means_none() {
        let admin = CatalogAdmin::new(Arc::new(MemoryStore::new()));
        match admin.add_movie(&submission("tt1", "Heat", Some(""))).await.unwrap() {
            AddOutcome::Added(movie) => assert_eq!(movie.expiration, None),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_remove_is_idempotent_and_keeps_bookings() {
        let store = MemoryStore::new();
        let admin = CatalogAdmin::new(Arc::new(store.clone()));
        admin.add_movie(&submission("tt0816692", "Interstellar", None)).await.unwrap();
        store
            .create_booking(&NewBooking {
                movie_title: "Interstellar".to_string(),
                show_date: "2030-01-01".to_string(),
                showtime: "7:00 PM".to_string(),
                showtime_available: None,
                quantity: 1,
                booked_by: "alice".to_string(),
            })
            .await
            .unwrap();

        assert!(admin.remove_movie("tt0816692").await.unwrap());
        assert!(!admin.remove_movie("tt0816692").await.unwrap());
        assert_eq!(store.list_bookings().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_title_and_clear_expiration() {
        let store = MemoryStore::new();
        let admin = CatalogAdmin::new(Arc::new(store.clone()));
        admin
            .add_movie(&submission("tt0133093", "Matrix", Some("2030-06-30")))
            .await
            .unwrap();

        let updated = admin
            .update_movie(&MovieUpdate {
                imdb_id: Some("tt0133093".to_string()),
                title: Some("The Matrix".to_string()),
                expiration: Some(String::new()),
            })
            .await
            .unwrap();
        assert_eq!(updated.title, "The Matrix");
        assert_eq!(updated.expiration, None);

        let missing = admin
            .update_movie(&MovieUpdate {
                imdb_id: Some("tt0000000".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(missing, CatalogError::NotFound(_)));
    }
}
