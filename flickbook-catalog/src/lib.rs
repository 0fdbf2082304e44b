pub mod admin;
pub mod cache;
pub mod knowledge;
pub mod listing;
pub mod window;

pub use admin::{AddOutcome, CatalogAdmin, CatalogError, MovieSubmission, MovieUpdate};
pub use cache::MetadataCache;
pub use knowledge::MovieChat;
pub use listing::{catalog, enrich, CatalogEntry};
pub use window::{check_show_date, ShowWindow, WindowError, WindowViolation};
