use async_trait::async_trait;
use chrono::NaiveDate;
use flickbook_core::repository::{MovieRepository, RepoResult};
use flickbook_shared::{Movie, MovieChanges, NewMovie};
use sqlx::PgPool;

pub struct StoreMovieRepository {
    pool: PgPool,
}

impl StoreMovieRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const MOVIE_COLUMNS: &str = "id, imdb_id, title, year, poster, expiration";

#[derive(sqlx::FromRow)]
struct MovieRow {
    id: i64,
    imdb_id: String,
    title: String,
    year: Option<String>,
    poster: Option<String>,
    expiration: Option<NaiveDate>,
}

impl From<MovieRow> for Movie {
    fn from(row: MovieRow) -> Self {
        Movie {
            id: row.id,
            imdb_id: row.imdb_id,
            title: row.title,
            year: row.year,
            poster: row.poster,
            expiration: row.expiration,
        }
    }
}

#[async_trait]
impl MovieRepository for StoreMovieRepository {
    async fn add_movie(&self, movie: &NewMovie) -> RepoResult<Movie> {
        let row = sqlx::query_as::<_, MovieRow>(&format!(
            r#"
            INSERT INTO movies (imdb_id, title, year, poster, expiration)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {MOVIE_COLUMNS}
            "#
        ))
        .bind(&movie.imdb_id)
        .bind(&movie.title)
        .bind(&movie.year)
        .bind(&movie.poster)
        .bind(movie.expiration)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_by_imdb_id(&self, imdb_id: &str) -> RepoResult<Option<Movie>> {
        let row = sqlx::query_as::<_, MovieRow>(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movies WHERE imdb_id = $1"
        ))
        .bind(imdb_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Movie::from))
    }

    async fn find_by_title(&self, title: &str) -> RepoResult<Option<Movie>> {
        let row = sqlx::query_as::<_, MovieRow>(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movies WHERE title = $1 ORDER BY id LIMIT 1"
        ))
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Movie::from))
    }

    async fn list_movies(&self) -> RepoResult<Vec<Movie>> {
        let rows = sqlx::query_as::<_, MovieRow>(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movies ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Movie::from).collect())
    }

    async fn update_movie(&self, imdb_id: &str, changes: &MovieChanges) -> RepoResult<Option<Movie>> {
        let row = sqlx::query_as::<_, MovieRow>(&format!(
            r#"
            UPDATE movies
            SET title = COALESCE($1, title),
                expiration = CASE WHEN $2 THEN $3::DATE ELSE expiration END
            WHERE imdb_id = $4
            RETURNING {MOVIE_COLUMNS}
            "#
        ))
        .bind(&changes.title)
        .bind(changes.expiration.is_some())
        .bind(changes.expiration.flatten())
        .bind(imdb_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Movie::from))
    }

    async fn delete_movie(&self, id: i64) -> RepoResult<()> {
        sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
