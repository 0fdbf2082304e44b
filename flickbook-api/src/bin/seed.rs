//! Creates the configured admin account and seeds the catalog from the
//! metadata provider. Safe to re-run; existing rows are skipped.

use anyhow::Context;
use chrono::{Duration, Local};
use flickbook_catalog::{AddOutcome, CatalogAdmin, MovieSubmission};
use flickbook_core::identity::Credentials;
use flickbook_core::metadata::MovieMetadataProvider;
use flickbook_shared::{NewUser, Role};
use flickbook_store::app_config::Config;
use flickbook_store::{OmdbClient, Repositories};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seed=info,flickbook_catalog=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    let stores = Repositories::open(&config.database)
        .await
        .context("Failed to open the booking store")?;

    let admin_name = &config.seed.admin_username;
    let existing = stores
        .users
        .find_by_username(admin_name)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;
    if existing.is_none() {
        let credentials = Credentials::new(config.auth.pepper.clone());
        let (password_hash, salt) = credentials.hash_password(&config.seed.admin_password)?;
        stores
            .users
            .create_user(&NewUser {
                username: admin_name.clone(),
                password_hash,
                salt,
                role: Role::Admin,
            })
            .await
            .map_err(|e| anyhow::anyhow!(e))?;
        tracing::info!("Admin user {} created", admin_name);
    } else {
        tracing::info!("Admin user {} already exists", admin_name);
    }

    let provider = OmdbClient::new(&config.metadata);
    let admin = CatalogAdmin::new(stores.movies.clone());
    let expiration = (Local::now().date_naive() + Duration::days(config.seed.theatrical_days))
        .format("%Y-%m-%d")
        .to_string();

    for title in &config.seed.titles {
        let hit = match provider.search(title).await {
            Ok(hits) => hits.into_iter().next(),
            Err(e) => {
                tracing::warn!("Search for {:?} failed: {}", title, e);
                None
            }
        };
        let Some(hit) = hit else {
            tracing::info!("Skipping {:?}: no results", title);
            continue;
        };

        let submission = MovieSubmission {
            imdb_id: Some(hit.imdb_id),
            title: Some(hit.title),
            year: Some(hit.year),
            poster: Some(hit.poster),
            expiration: Some(expiration.clone()),
        };
        match admin.add_movie(&submission).await? {
            AddOutcome::Added(movie) => tracing::info!("Added movie {}", movie.title),
            AddOutcome::AlreadyAdded(movie) => tracing::info!("Skipping {} (already in catalog)", movie.title),
        }
    }

    tracing::info!("Seeding complete");
    Ok(())
}
