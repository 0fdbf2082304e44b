#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use flickbook_api::middleware::auth::issue_token;
use flickbook_api::{app, AppState, AuthConfig, Collaborators};
use flickbook_booking::CheckoutTerms;
use flickbook_core::assistant::{Assistant, AssistantError};
use flickbook_core::identity::Credentials;
use flickbook_core::metadata::{MetadataError, MovieDetails, MovieMetadataProvider, SearchHit};
use flickbook_core::repository::{BookingRepository, MovieRepository, RepoResult, UserRepository};
use flickbook_shared::{Booking, BookingChanges, Identity, NewBooking, NewMovie, NewUser, Role, User};
use flickbook_store::{MemoryStore, MockCheckoutProvider, Repositories};
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot`

pub const WEBHOOK_SECRET: &str = "whsec_test_secret";

/// Metadata stub: every id is a drama; searches return one hit.
pub struct StubMetadata;

#[async_trait]
impl MovieMetadataProvider for StubMetadata {
    async fn movie_details(&self, imdb_id: &str) -> Result<MovieDetails, MetadataError> {
        if imdb_id.starts_with("tt_down") {
            return Err(MetadataError::Request("provider down".to_string()));
        }
        let mut details = MovieDetails::fallback(imdb_id, "From provider");
        details.genre = "Drama".to_string();
        details.rating = "7.9".to_string();
        Ok(details)
    }

    async fn search(&self, term: &str) -> Result<Vec<SearchHit>, MetadataError> {
        Ok(vec![SearchHit {
            imdb_id: "tt0000001".to_string(),
            title: term.to_string(),
            year: "2025".to_string(),
            poster: "N/A".to_string(),
        }])
    }
}

pub struct StubAssistant;

#[async_trait]
impl Assistant for StubAssistant {
    async fn generate(&self, prompt: &str) -> Result<String, AssistantError> {
        if prompt.contains("User: fail") {
            return Err(AssistantError::Request("connection refused".to_string()));
        }
        Ok("Try the drama tonight.".to_string())
    }
}

/// Detail carried by every failed write; it must never reach a response body.
pub const WRITE_FAILURE: &str = "disk quota exceeded on bookings_pkey";

/// Reads go to the memory store, every write fails.
pub struct FailingWrites(pub MemoryStore);

fn write_failure<T>() -> RepoResult<T> {
    Err(WRITE_FAILURE.into())
}

#[async_trait]
impl UserRepository for FailingWrites {
    async fn create_user(&self, _user: &NewUser) -> RepoResult<User> {
        write_failure()
    }

    async fn get_user(&self, id: i64) -> RepoResult<Option<User>> {
        self.0.get_user(id).await
    }

    async fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        self.0.find_by_username(username).await
    }

    async fn list_users(&self) -> RepoResult<Vec<User>> {
        self.0.list_users().await
    }

    async fn delete_user_cascade(&self, _id: i64) -> RepoResult<Option<u64>> {
        write_failure()
    }
}

#[async_trait]
impl BookingRepository for FailingWrites {
    async fn create_booking(&self, _booking: &NewBooking) -> RepoResult<Booking> {
        write_failure()
    }

    async fn get_booking(&self, id: i64) -> RepoResult<Option<Booking>> {
        self.0.get_booking(id).await
    }

    async fn list_bookings(&self) -> RepoResult<Vec<Booking>> {
        self.0.list_bookings().await
    }

    async fn list_bookings_for(&self, username: &str) -> RepoResult<Vec<Booking>> {
        self.0.list_bookings_for(username).await
    }

    async fn find_matching(&self, booking: &NewBooking) -> RepoResult<Option<Booking>> {
        self.0.find_matching(booking).await
    }

    async fn update_booking(&self, _id: i64, _changes: &BookingChanges) -> RepoResult<Option<Booking>> {
        write_failure()
    }

    async fn delete_booking(&self, _id: i64) -> RepoResult<bool> {
        write_failure()
    }
}

pub struct TestApp {
    pub store: MemoryStore,
    pub checkout: MockCheckoutProvider,
    pub state: AppState,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub text: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.text).unwrap_or(Value::Null)
    }
}

impl TestApp {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let stores = Repositories::in_memory(store.clone());
        Self::over(store, stores)
    }

    /// App whose user and booking writes fail; `store` still shows what is persisted.
    pub fn with_failing_writes() -> Self {
        let store = MemoryStore::new();
        let mut stores = Repositories::in_memory(store.clone());
        let failing = Arc::new(FailingWrites(store.clone()));
        let users: Arc<dyn UserRepository> = failing.clone();
        let bookings: Arc<dyn BookingRepository> = failing;
        stores.users = users;
        stores.bookings = bookings;
        Self::over(store, stores)
    }

    fn over(store: MemoryStore, stores: Repositories) -> Self {
        let checkout = MockCheckoutProvider::new(WEBHOOK_SECRET);

        let state = AppState::new(
            Collaborators {
                users: stores.users,
                movies: stores.movies,
                bookings: stores.bookings,
                metadata: Arc::new(StubMetadata),
                checkout: Arc::new(checkout.clone()),
                assistant: Arc::new(StubAssistant),
            },
            Credentials::new("test-pepper"),
            AuthConfig {
                secret: "test-jwt-secret".to_string(),
                expiration: 3600,
                cookie_secure: false,
            },
            CheckoutTerms {
                unit_amount: 1200,
                currency: "usd".to_string(),
                public_url: "http://localhost:5000".to_string(),
            },
        );

        Self { store, checkout, state }
    }

    pub fn router(&self) -> Router {
        app(self.state.clone())
    }

    pub fn token(&self, username: &str, role: Role) -> String {
        issue_token(&self.state.auth, &Identity::new(username, role)).unwrap()
    }

    pub async fn send_request(&self, request: Request<Body>) -> TestResponse {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        TestResponse {
            status,
            headers,
            text: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    pub async fn send(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send_request(request).await
    }

    pub async fn add_movie(&self, imdb_id: &str, title: &str, expiration: Option<NaiveDate>) {
        self.store
            .add_movie(&NewMovie {
                imdb_id: imdb_id.to_string(),
                title: title.to_string(),
                year: Some("2025".to_string()),
                poster: None,
                expiration,
            })
            .await
            .unwrap();
    }

    pub async fn add_booking(&self, owner: &str, title: &str) -> Booking {
        self.store
            .create_booking(&NewBooking {
                movie_title: title.to_string(),
                show_date: "2030-02-01".to_string(),
                showtime: "7:00 PM".to_string(),
                showtime_available: Some(10),
                quantity: 2,
                booked_by: owner.to_string(),
            })
            .await
            .unwrap()
    }

    pub async fn bookings(&self) -> Vec<Booking> {
        self.store.list_bookings().await.unwrap()
    }
}

pub fn today_plus(days: i64) -> NaiveDate {
    chrono::Local::now().date_naive() + chrono::Duration::days(days)
}
