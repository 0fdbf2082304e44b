use flickbook_core::repository::{BookingRepository, MovieRepository, UserRepository};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::app_config::DatabaseConfig;
use crate::{MemoryStore, StoreBookingRepository, StoreMovieRepository, StoreUserRepository};

/// `database.url` value selecting the in-process store.
pub const MEMORY_URL: &str = "memory";

#[derive(Debug, thiserror::Error)]
pub enum StoreInitError {
    #[error("database connection failed: {0}")]
    Connect(#[from] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// The three stores behind their traits.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub movies: Arc<dyn MovieRepository>,
    pub bookings: Arc<dyn BookingRepository>,
}

impl Repositories {
    pub fn in_memory(store: MemoryStore) -> Self {
        let users: Arc<dyn UserRepository> = Arc::new(store.clone());
        let movies: Arc<dyn MovieRepository> = Arc::new(store.clone());
        let bookings: Arc<dyn BookingRepository> = Arc::new(store);
        Self { users, movies, bookings }
    }

    /// Open the configured store, running migrations against Postgres.
    pub async fn open(config: &DatabaseConfig) -> Result<Self, StoreInitError> {
        if config.url == MEMORY_URL {
            warn!("Using the in-memory store; data is lost on restart");
            return Ok(Self::in_memory(MemoryStore::new()));
        }

        let pool = connect(config).await?;

        let users: Arc<dyn UserRepository> = Arc::new(StoreUserRepository::new(pool.clone()));
        let movies: Arc<dyn MovieRepository> = Arc::new(StoreMovieRepository::new(pool.clone()));
        let bookings: Arc<dyn BookingRepository> = Arc::new(StoreBookingRepository::new(pool));
        Ok(Self { users, movies, bookings })
    }
}

async fn connect(config: &DatabaseConfig) -> Result<PgPool, StoreInitError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&config.url)
        .await?;

    info!("Applying schema migrations");
    sqlx::migrate!("../migrations").run(&pool).await?;
    Ok(pool)
}
