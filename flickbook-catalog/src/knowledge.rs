use flickbook_core::assistant::{Assistant, AssistantError};
use flickbook_core::metadata::MovieMetadataProvider;
use flickbook_core::repository::{MovieRepository, RepoResult};
use flickbook_shared::Movie;
use std::sync::Arc;
use tracing::warn;

pub const NO_MOVIES: &str = "No movies available.";
pub const ASSISTANT_FAILED: &str = "LLM Error.";
pub const EMPTY_REPLY: &str = "Sorry, I couldn't generate a response.";

/// One line of context per catalog movie.
pub async fn build_movie_knowledge(movies: &[Movie], provider: &dyn MovieMetadataProvider) -> String {
    if movies.is_empty() {
        return NO_MOVIES.to_string();
    }

    let mut lines = Vec::with_capacity(movies.len());
    for movie in movies {
        match provider.movie_details(&movie.imdb_id).await {
            Ok(d) => lines.push(format!(
                "Title: {}. Genre: {}. Actors: {}. Rating: {}. Plot: {}",
                movie.title, d.genre, d.actors, d.rating, d.plot
            )),
            Err(e) => {
                warn!("Metadata unavailable for {}: {}", movie.imdb_id, e);
                lines.push(format!("Title: {}. Limited info available.", movie.title));
            }
        }
    }
    lines.join("\n")
}

pub fn build_prompt(context: &str, user_message: &str) -> String {
    format!(
        "You are FlickBook's concise movie assistant.\n\n\
         Use ONLY the movie data provided below.\n\
         If the user asks about movies, an actor, genre, rating, or plot, check the provided movie list.\n\n\
         Keep answers SHORT:\n\
         - 1 to 2 sentences\n\
         - Directly answer the question\n\
         - Do NOT include long lists or summaries unless asked\n\n\
         Movie Data:\n{}\n\nUser: {}",
        context, user_message
    )
}

/// Catalog-aware chat over the local assistant.
#[derive(Clone)]
pub struct MovieChat {
    movies: Arc<dyn MovieRepository>,
    metadata: Arc<dyn MovieMetadataProvider>,
    assistant: Arc<dyn Assistant>,
}

impl MovieChat {
    pub fn new(
        movies: Arc<dyn MovieRepository>,
        metadata: Arc<dyn MovieMetadataProvider>,
        assistant: Arc<dyn Assistant>,
    ) -> Self {
        Self {
            movies,
            metadata,
            assistant,
        }
    }

    /// Reply to `message`. Assistant failures become a fixed reply; only a
    /// catalog read failure is an error.
    pub async fn reply(&self, message: &str) -> RepoResult<String> {
        let movies = self.movies.list_movies().await?;
        let context = build_movie_knowledge(&movies, self.metadata.as_ref()).await;
        let prompt = build_prompt(&context, message);

        Ok(match self.assistant.generate(&prompt).await {
            Ok(reply) => reply,
            Err(AssistantError::Empty) => EMPTY_REPLY.to_string(),
            Err(e) => {
                warn!("Assistant failed: {}", e);
                ASSISTANT_FAILED.to_string()
            }
        })
    }
}
