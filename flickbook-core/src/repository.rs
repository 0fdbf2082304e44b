use async_trait::async_trait;
use flickbook_shared::{
    Booking, BookingChanges, Movie, MovieChanges, NewBooking, NewMovie, NewUser, User,
};

pub type RepoError = Box<dyn std::error::Error + Send + Sync>;
pub type RepoResult<T> = Result<T, RepoError>;

/// Identity store: user accounts and credentials.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: &NewUser) -> RepoResult<User>;

    async fn get_user(&self, id: i64) -> RepoResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> RepoResult<Option<User>>;

    /// All users, ordered by id.
    async fn list_users(&self) -> RepoResult<Vec<User>>;

    /// Delete the user and every booking owned by that username in one
    /// unit of work. Returns the number of bookings removed, or `None` when
    /// the user does not exist.
    async fn delete_user_cascade(&self, id: i64) -> RepoResult<Option<u64>>;
}

/// Catalog store.
#[async_trait]
pub trait MovieRepository: Send + Sync {
    async fn add_movie(&self, movie: &NewMovie) -> RepoResult<Movie>;

    async fn find_by_imdb_id(&self, imdb_id: &str) -> RepoResult<Option<Movie>>;

    /// Exact title match; the first match wins when titles repeat.
    async fn find_by_title(&self, title: &str) -> RepoResult<Option<Movie>>;

    async fn list_movies(&self) -> RepoResult<Vec<Movie>>;

    async fn update_movie(&self, imdb_id: &str, changes: &MovieChanges) -> RepoResult<Option<Movie>>;

    async fn delete_movie(&self, id: i64) -> RepoResult<()>;
}

/// Booking store.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create_booking(&self, booking: &NewBooking) -> RepoResult<Booking>;

    async fn get_booking(&self, id: i64) -> RepoResult<Option<Booking>>;

    /// Every booking, newest first.
    async fn list_bookings(&self) -> RepoResult<Vec<Booking>>;

    /// Bookings owned by `username`, newest first.
    async fn list_bookings_for(&self, username: &str) -> RepoResult<Vec<Booking>>;

    /// An existing booking recording the same purchase, see [`NewBooking::matches`].
    async fn find_matching(&self, booking: &NewBooking) -> RepoResult<Option<Booking>>;

    async fn update_booking(&self, id: i64, changes: &BookingChanges) -> RepoResult<Option<Booking>>;

    /// Returns whether a row was removed.
    async fn delete_booking(&self, id: i64) -> RepoResult<bool>;
}
