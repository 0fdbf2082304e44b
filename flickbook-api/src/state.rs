use std::sync::Arc;

use flickbook_booking::{BookingPolicy, CheckoutTerms, Reconciler};
use flickbook_catalog::{CatalogAdmin, MovieChat, ShowWindow};
use flickbook_core::assistant::Assistant;
use flickbook_core::identity::Credentials;
use flickbook_core::metadata::MovieMetadataProvider;
use flickbook_core::payment::CheckoutProvider;
use flickbook_core::repository::{BookingRepository, MovieRepository, UserRepository};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    /// Token lifetime in seconds.
    pub expiration: u64,
    pub cookie_secure: bool,
}

/// Stores and outside services the router is built over.
pub struct Collaborators {
    pub users: Arc<dyn UserRepository>,
    pub movies: Arc<dyn MovieRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub metadata: Arc<dyn MovieMetadataProvider>,
    pub checkout: Arc<dyn CheckoutProvider>,
    pub assistant: Arc<dyn Assistant>,
}

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub movies: Arc<dyn MovieRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub metadata: Arc<dyn MovieMetadataProvider>,
    pub checkout: Arc<dyn CheckoutProvider>,
    pub credentials: Credentials,
    pub auth: AuthConfig,
    pub terms: CheckoutTerms,
    pub catalog_admin: CatalogAdmin,
    pub window: ShowWindow,
    pub policy: BookingPolicy,
    pub reconciler: Reconciler,
    pub chat: MovieChat,
}

impl AppState {
    pub fn new(
        parts: Collaborators,
        credentials: Credentials,
        auth: AuthConfig,
        terms: CheckoutTerms,
    ) -> Self {
        Self {
            catalog_admin: CatalogAdmin::new(parts.movies.clone()),
            window: ShowWindow::new(parts.movies.clone()),
            policy: BookingPolicy::new(parts.bookings.clone()),
            reconciler: Reconciler::new(parts.bookings.clone()),
            chat: MovieChat::new(parts.movies.clone(), parts.metadata.clone(), parts.assistant),
            users: parts.users,
            movies: parts.movies,
            bookings: parts.bookings,
            metadata: parts.metadata,
            checkout: parts.checkout,
            credentials,
            auth,
            terms,
        }
    }
}
