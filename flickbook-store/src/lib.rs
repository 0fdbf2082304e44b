pub mod app_config;
pub mod booking_repo;
pub mod memory;
pub mod mock_checkout;
pub mod movie_repo;
pub mod ollama;
pub mod omdb;
pub mod repositories;
pub mod stripe;
pub mod user_repo;

pub use booking_repo::StoreBookingRepository;
pub use memory::MemoryStore;
pub use mock_checkout::MockCheckoutProvider;
pub use movie_repo::StoreMovieRepository;
pub use ollama::OllamaClient;
pub use omdb::OmdbClient;
pub use repositories::Repositories;
pub use stripe::StripeClient;
pub use user_repo::StoreUserRepository;
