use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use flickbook_catalog::{catalog, enrich};
use serde_json::{json, Value};

use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/movies", get(list_movies))
        .route("/api/movies/{imdb_id}", get(get_movie))
}

async fn list_movies(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let movies = catalog(state.movies.as_ref(), state.metadata.as_ref())
        .await
        .map_err(|e| AppError::store("Failed to load movies", e))?;
    Ok(Json(json!({ "movies": movies })))
}

async fn get_movie(
    State(state): State<AppState>,
    Path(imdb_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let movie = state
        .movies
        .find_by_imdb_id(&imdb_id)
        .await
        .map_err(|e| AppError::store("Failed to load movie", e))?
        .ok_or_else(|| AppError::NotFoundError("Movie not found".to_string()))?;

    Ok(Json(json!({ "movie": enrich(&movie, state.metadata.as_ref()).await })))
}
