use axum::{
    body::Bytes,
    extract::{Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use flickbook_catalog::{CatalogError, MovieSubmission, MovieUpdate};
use flickbook_shared::Identity;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::middleware::Session;
use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RemoveMovieRequest {
    #[serde(default)]
    pub imdb_id: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/movies", get(list_movies))
        .route("/admin/search-movies", get(search_movies))
        .route("/admin/add-movie", post(add_movie))
        .route("/admin/remove-movie", post(remove_movie))
        .route("/admin/update-movie", post(update_movie))
}

/// Movie admin pages send anonymous visitors home instead of answering 401.
fn page_gate(session: &Session) -> Result<&Identity, AppError> {
    match session.identity() {
        None => Err(AppError::LoginRedirect),
        Some(identity) if identity.is_admin() => Ok(identity),
        Some(_) => Err(AppError::AuthorizationError("Admin access required".to_string())),
    }
}

/// Decode a form body once the caller has passed the gate. An empty body
/// counts as `{}`.
fn form_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, AppError> {
    if body.is_empty() {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::ValidationError(format!("Invalid request body: {}", e)))
}

fn catalog_error(err: CatalogError) -> AppError {
    let message = err.to_string();
    match err {
        CatalogError::MissingFields | CatalogError::InvalidExpiration(_) => AppError::ValidationError(message),
        CatalogError::NotFound(_) => AppError::NotFoundError(message),
        CatalogError::Store(e) => AppError::store("Catalog update failed", e),
    }
}

/// GET /admin/movies
async fn list_movies(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Value>, AppError> {
    page_gate(&session)?;
    let movies = state
        .movies
        .list_movies()
        .await
        .map_err(|e| AppError::store("Failed to load movies", e))?;
    Ok(Json(json!({ "movies": movies })))
}

/// GET /admin/search-movies?q=
async fn search_movies(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Value>, AppError> {
    page_gate(&session)?;

    let term = query.q.trim();
    let results = if term.is_empty() {
        Vec::new()
    } else {
        state.metadata.search(term).await.unwrap_or_else(|e| {
            tracing::warn!("Movie search for {:?} failed: {}", term, e);
            Vec::new()
        })
    };
    Ok(Json(json!({ "results": results })))
}

/// POST /admin/add-movie
async fn add_movie(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let admin = page_gate(&session)?;
    let submission: MovieSubmission = form_body(&body)?;
    let outcome = state.catalog_admin.add_movie(&submission).await.map_err(catalog_error)?;
    tracing::debug!("{} by {}", outcome.message(), admin.username);
    Ok(Json(json!({ "message": outcome.message() })))
}

/// POST /admin/remove-movie
async fn remove_movie(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    page_gate(&session)?;
    let req: RemoveMovieRequest = form_body(&body)?;
    state.catalog_admin.remove_movie(&req.imdb_id).await.map_err(catalog_error)?;
    Ok(Json(json!({ "message": "Movie removed" })))
}

/// POST /admin/update-movie
async fn update_movie(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    page_gate(&session)?;
    let update: MovieUpdate = form_body(&body)?;
    let movie = state.catalog_admin.update_movie(&update).await.map_err(catalog_error)?;
    Ok(Json(json!({ "message": "Movie updated", "movie": movie })))
}
