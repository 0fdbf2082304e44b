use async_trait::async_trait;
use chrono::Utc;
use flickbook_core::repository::{
    BookingRepository, MovieRepository, RepoResult, UserRepository,
};
use flickbook_shared::{
    Booking, BookingChanges, Movie, MovieChanges, NewBooking, NewMovie, NewUser, User,
};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum MemoryStoreError {
    #[error("duplicate key value violates unique constraint {0}")]
    UniqueViolation(&'static str),
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    movies: Vec<Movie>,
    bookings: Vec<Booking>,
    last_user_id: i64,
    last_movie_id: i64,
    last_booking_id: i64,
}

/// Process-local store implementing every repository trait over one lock.
///
/// Used by tests and by `database.url = "memory"` runs. Each trait method
/// holds the write lock for its whole mutation, so a write is either fully
/// visible or not at all.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(bookings: &mut [Booking]) {
    bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, user: &NewUser) -> RepoResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(MemoryStoreError::UniqueViolation("users_username_key").into());
        }

        tables.last_user_id += 1;
        let stored = User {
            id: tables.last_user_id,
            username: user.username.clone(),
            password_hash: user.password_hash.clone(),
            salt: user.salt.clone(),
            role: user.role,
        };
        tables.users.push(stored.clone());
        Ok(stored)
    }

    async fn get_user(&self, id: i64) -> RepoResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn list_users(&self) -> RepoResult<Vec<User>> {
        let tables = self.tables.read().await;
        let mut users = tables.users.clone();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    async fn delete_user_cascade(&self, id: i64) -> RepoResult<Option<u64>> {
        let mut tables = self.tables.write().await;
        let Some(position) = tables.users.iter().position(|u| u.id == id) else {
            return Ok(None);
        };

        let user = tables.users.remove(position);
        let before = tables.bookings.len();
        tables.bookings.retain(|b| b.booked_by != user.username);
        Ok(Some((before - tables.bookings.len()) as u64))
    }
}

#[async_trait]
impl MovieRepository for MemoryStore {
    async fn add_movie(&self, movie: &NewMovie) -> RepoResult<Movie> {
        let mut tables = self.tables.write().await;
        if tables.movies.iter().any(|m| m.imdb_id == movie.imdb_id) {
            return Err(MemoryStoreError::UniqueViolation("movies_imdb_id_key").into());
        }

        tables.last_movie_id += 1;
        let stored = Movie {
            id: tables.last_movie_id,
            imdb_id: movie.imdb_id.clone(),
            title: movie.title.clone(),
            year: movie.year.clone(),
            poster: movie.poster.clone(),
            expiration: movie.expiration,
        };
        tables.movies.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_imdb_id(&self, imdb_id: &str) -> RepoResult<Option<Movie>> {
        let tables = self.tables.read().await;
        Ok(tables.movies.iter().find(|m| m.imdb_id == imdb_id).cloned())
    }

    async fn find_by_title(&self, title: &str) -> RepoResult<Option<Movie>> {
        let tables = self.tables.read().await;
        Ok(tables.movies.iter().find(|m| m.title == title).cloned())
    }

    async fn list_movies(&self) -> RepoResult<Vec<Movie>> {
        let tables = self.tables.read().await;
        Ok(tables.movies.clone())
    }

    async fn update_movie(&self, imdb_id: &str, changes: &MovieChanges) -> RepoResult<Option<Movie>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .movies
            .iter_mut()
            .find(|m| m.imdb_id == imdb_id)
            .map(|movie| {
                movie.apply(changes);
                movie.clone()
            }))
    }

    async fn delete_movie(&self, id: i64) -> RepoResult<()> {
        let mut tables = self.tables.write().await;
        tables.movies.retain(|m| m.id != id);
        Ok(())
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn create_booking(&self, booking: &NewBooking) -> RepoResult<Booking> {
        let mut tables = self.tables.write().await;
        tables.last_booking_id += 1;
        let stored = Booking {
            id: tables.last_booking_id,
            movie_title: booking.movie_title.clone(),
            show_date: booking.show_date.clone(),
            showtime: booking.showtime.clone(),
            showtime_available: booking.showtime_available,
            quantity: booking.quantity,
            booked_by: booking.booked_by.clone(),
            created_at: Utc::now(),
        };
        tables.bookings.push(stored.clone());
        Ok(stored)
    }

    async fn get_booking(&self, id: i64) -> RepoResult<Option<Booking>> {
        let tables = self.tables.read().await;
        Ok(tables.bookings.iter().find(|b| b.id == id).cloned())
    }

    async fn list_bookings(&self) -> RepoResult<Vec<Booking>> {
        let tables = self.tables.read().await;
        let mut bookings = tables.bookings.clone();
        newest_first(&mut bookings);
        Ok(bookings)
    }

    async fn list_bookings_for(&self, username: &str) -> RepoResult<Vec<Booking>> {
        let tables = self.tables.read().await;
        let mut bookings: Vec<Booking> = tables
            .bookings
            .iter()
            .filter(|b| b.booked_by == username)
            .cloned()
            .collect();
        newest_first(&mut bookings);
        Ok(bookings)
    }

    async fn find_matching(&self, booking: &NewBooking) -> RepoResult<Option<Booking>> {
        let tables = self.tables.read().await;
        Ok(tables.bookings.iter().find(|b| booking.matches(b)).cloned())
    }

    async fn update_booking(&self, id: i64, changes: &BookingChanges) -> RepoResult<Option<Booking>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .bookings
            .iter_mut()
            .find(|b| b.id == id)
            .map(|booking| {
                booking.apply(changes);
                booking.clone()
            }))
    }

    async fn delete_booking(&self, id: i64) -> RepoResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.bookings.len();
        tables.bookings.retain(|b| b.id != id);
        Ok(tables.bookings.len() < before)
    }
}
