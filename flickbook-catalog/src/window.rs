use chrono::NaiveDate;
use flickbook_core::repository::{MovieRepository, RepoError};
use flickbook_shared::Movie;
use std::sync::Arc;

/// A show date that falls outside a movie's bookable run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WindowViolation {
    #[error("Invalid show date '{date}'. Use YYYY-MM-DD; {title} is showing until {expiration}")]
    Unparseable {
        date: String,
        title: String,
        expiration: NaiveDate,
    },
    #[error("Show date {date} is in the past; {title} is showing until {expiration}")]
    Past {
        date: NaiveDate,
        title: String,
        expiration: NaiveDate,
    },
    #[error("{title} is only showing until {expiration}; {date} is not bookable")]
    AfterExpiration {
        date: NaiveDate,
        title: String,
        expiration: NaiveDate,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum WindowError {
    #[error(transparent)]
    Violation(#[from] WindowViolation),
    #[error("catalog store failure: {0}")]
    Store(#[from] RepoError),
}

/// Check `show_date` against `movie`'s run. A movie without an expiration
/// accepts any date.
pub fn check_show_date(movie: &Movie, show_date: &str, today: NaiveDate) -> Result<(), WindowViolation> {
    let Some(expiration) = movie.expiration else {
        return Ok(());
    };

    let date = NaiveDate::parse_from_str(show_date.trim(), "%Y-%m-%d").map_err(|_| {
        WindowViolation::Unparseable {
            date: show_date.to_string(),
            title: movie.title.clone(),
            expiration,
        }
    })?;

    if date < today {
        return Err(WindowViolation::Past {
            date,
            title: movie.title.clone(),
            expiration,
        });
    }
    if date > expiration {
        return Err(WindowViolation::AfterExpiration {
            date,
            title: movie.title.clone(),
            expiration,
        });
    }
    Ok(())
}

/// Show-date gate applied before a booking is created.
#[derive(Clone)]
pub struct ShowWindow {
    movies: Arc<dyn MovieRepository>,
}

impl ShowWindow {
    pub fn new(movies: Arc<dyn MovieRepository>) -> Self {
        Self { movies }
    }

    /// Enforce the window for the movie whose title matches exactly.
    /// An unknown title is not checked at all.
    pub async fn enforce(&self, movie_title: &str, show_date: &str) -> Result<(), WindowError> {
        self.enforce_on(movie_title, show_date, chrono::Local::now().date_naive())
            .await
    }

    pub async fn enforce_on(
        &self,
        movie_title: &str,
        show_date: &str,
        today: NaiveDate,
    ) -> Result<(), WindowError> {
        match self.movies.find_by_title(movie_title).await? {
            Some(movie) => Ok(check_show_date(&movie, show_date, today)?),
            None => Ok(()),
        }
    }
}
