pub mod auth;

pub use auth::{session_middleware, Session, SessionClaims, ACCESS_COOKIE};
