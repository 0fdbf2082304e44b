use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use flickbook_api::{app, AppState, AuthConfig, Collaborators};
use flickbook_booking::CheckoutTerms;
use flickbook_catalog::MetadataCache;
use flickbook_core::identity::Credentials;
use flickbook_core::payment::CheckoutProvider;
use flickbook_store::app_config::{Config, PaymentProvider};
use flickbook_store::{MockCheckoutProvider, OllamaClient, OmdbClient, Repositories, StripeClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flickbook_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting FlickBook API on port {}", config.server.port);

    let stores = Repositories::open(&config.database)
        .await
        .context("Failed to open the booking store")?;

    let checkout: Arc<dyn CheckoutProvider> = match config.payments.provider {
        PaymentProvider::Stripe => Arc::new(StripeClient::new(&config.payments)?),
        PaymentProvider::Mock => {
            tracing::warn!("Using the mock checkout provider");
            Arc::new(MockCheckoutProvider::new(config.payments.webhook_secret.clone()).auto_completing())
        }
    };

    let metadata = Arc::new(MetadataCache::new(
        Arc::new(OmdbClient::new(&config.metadata)),
        Duration::from_secs(config.metadata.cache_ttl_seconds),
    ));

    let app_state = AppState::new(
        Collaborators {
            users: stores.users,
            movies: stores.movies,
            bookings: stores.bookings,
            metadata,
            checkout,
            assistant: Arc::new(OllamaClient::new(&config.assistant)?),
        },
        Credentials::new(config.auth.pepper.clone()),
        AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
            cookie_secure: config.auth.cookie_secure,
        },
        CheckoutTerms {
            unit_amount: config.payments.ticket_price_cents,
            currency: config.payments.currency.clone(),
            public_url: config.server.public_url.clone(),
        },
    );

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
