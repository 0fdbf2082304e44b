use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use chrono::{Duration, Utc};
use flickbook_shared::{Identity, Role};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::{AppState, AuthConfig};

pub const ACCESS_COOKIE: &str = "access_token_cookie";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

/// Request-scoped caller context. Anonymous when no valid token was sent.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub identity: Option<Identity>,
}

impl Session {
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn username(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.username.as_str())
    }
}

pub fn issue_token(auth: &AuthConfig, identity: &Identity) -> Result<String, AppError> {
    let claims = SessionClaims {
        sub: identity.username.clone(),
        role: identity.role.as_str().to_owned(),
        exp: (Utc::now() + Duration::seconds(auth.expiration as i64)).timestamp() as usize,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(auth.secret.as_bytes()))
        .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))
}

/// Identity carried by `token`, if it is well-formed, signed by us and unexpired.
pub fn decode_token(auth: &AuthConfig, token: &str) -> Option<Identity> {
    let data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(auth.secret.as_bytes()),
        &Validation::default(),
    )
    .ok()?;

    let role = Role::parse(&data.claims.role)?;
    Some(Identity::new(data.claims.sub, role))
}

fn request_token(req: &Request) -> Option<String> {
    let bearer = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string);

    bearer.or_else(|| {
        CookieJar::from_headers(req.headers())
            .get(ACCESS_COOKIE)
            .map(|c| c.value().to_string())
    })
}

/// Attach a [`Session`] to every request. Never rejects; handlers decide
/// between 401 and 403.
pub async fn session_middleware(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let identity = request_token(&req).and_then(|token| decode_token(&state.auth, &token));
    req.extensions_mut().insert(Session { identity });
    next.run(req).await
}
