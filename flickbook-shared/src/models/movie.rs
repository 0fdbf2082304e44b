use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A catalog entry. `imdb_id` is the external catalog id and is unique.
///
/// Bookings refer to movies by `title` text only, so renaming or deleting a
/// movie leaves existing bookings untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    pub id: i64,
    pub imdb_id: String,
    pub title: String,
    pub year: Option<String>,
    pub poster: Option<String>,
    /// Last bookable show date, if the theatrical run is bounded.
    pub expiration: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMovie {
    pub imdb_id: String,
    pub title: String,
    pub year: Option<String>,
    pub poster: Option<String>,
    pub expiration: Option<NaiveDate>,
}

/// Partial update of a movie. `expiration: Some(None)` clears the date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovieChanges {
    pub title: Option<String>,
    pub expiration: Option<Option<NaiveDate>>,
}

impl Movie {
    pub fn apply(&mut self, changes: &MovieChanges) {
        if let Some(title) = &changes.title {
            self.title = title.clone();
        }
        if let Some(expiration) = changes.expiration {
            self.expiration = expiration;
        }
    }
}
