use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use flickbook_shared::{Identity, NewUser, Role};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::middleware::auth::{issue_token, ACCESS_COOKIE};
use crate::{error::AppError, state::AppState};

const MISSING: &str = "Missing data for required field.";
const NOT_A_STRING: &str = "Not a valid string.";

#[derive(Debug, Serialize, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub msg: &'static str,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    message: &'static str,
    token: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", get(logout))
}

fn username_rule(username: &str) -> Option<&'static str> {
    if username.chars().count() < 4 {
        return Some("Username must have at least 4 characters");
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Some("Username may only contain letters, numbers, and underscores");
    }
    None
}

fn password_rule(password: &str) -> Option<&'static str> {
    if password.chars().count() < 8 {
        return Some("Password must be at least 8 characters");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Some("Password must have a number");
    }
    if password.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Some("Password must have at least 1 special character");
    }
    None
}

/// Validated registration: trimmed username, password, role.
pub fn validate_registration(payload: &Value) -> Result<(String, String, Role), Vec<FieldError>> {
    let mut errors = Vec::new();

    let username = match payload.get("username") {
        None | Some(Value::Null) => {
            errors.push(FieldError { field: "username", msg: MISSING });
            None
        }
        Some(Value::String(raw)) => {
            let trimmed = raw.trim();
            match username_rule(trimmed) {
                Some(msg) => {
                    errors.push(FieldError { field: "username", msg });
                    None
                }
                None => Some(trimmed.to_string()),
            }
        }
        Some(_) => {
            errors.push(FieldError { field: "username", msg: NOT_A_STRING });
            None
        }
    };

    let password = match payload.get("password") {
        None | Some(Value::Null) => {
            errors.push(FieldError { field: "password", msg: MISSING });
            None
        }
        Some(Value::String(raw)) => match password_rule(raw) {
            Some(msg) => {
                errors.push(FieldError { field: "password", msg });
                None
            }
            None => Some(raw.clone()),
        },
        Some(_) => {
            errors.push(FieldError { field: "password", msg: NOT_A_STRING });
            None
        }
    };

    let role = match payload.get("role") {
        None => Some(Role::User),
        Some(Value::String(raw)) => Role::parse(raw),
        Some(_) => None,
    };
    if role.is_none() {
        errors.push(FieldError { field: "role", msg: "Must be one of: admin, user." });
    }

    match (username, password, role) {
        (Some(username), Some(password), Some(role)) if errors.is_empty() => Ok((username, password, role)),
        _ => Err(errors),
    }
}

async fn register(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let (username, password, role) = validate_registration(&payload).map_err(|errors| AppError::InvalidPayload {
        message: "Invalid input".to_string(),
        errors: json!(errors),
    })?;

    let existing = state
        .users
        .find_by_username(&username)
        .await
        .map_err(|e| AppError::store("Registration failed", e))?;
    if existing.is_some() {
        return Err(AppError::ConflictError("User already exists".to_string()));
    }

    let (password_hash, salt) = state
        .credentials
        .hash_password(&password)
        .map_err(|e| AppError::store("Registration failed", e))?;

    state
        .users
        .create_user(&NewUser {
            username: username.clone(),
            password_hash,
            salt,
            role,
        })
        .await
        .map_err(|e| AppError::store("Registration failed", e))?;

    tracing::info!("Registered user {} with role {}", username, role);
    Ok((StatusCode::CREATED, Json(json!({ "message": "User registered successfully" }))))
}

fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    Cookie::build((ACCESS_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(state.auth.cookie_secure)
        .same_site(SameSite::Lax)
        .build()
}

fn cleared(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(ACCESS_COOKIE).path("/"))
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, (CookieJar, AppError)> {
    let user = match state.users.find_by_username(&req.username).await {
        Ok(Some(user)) => user,
        Ok(None) => return Err((cleared(jar), AppError::NotFoundError("User not found".to_string()))),
        Err(e) => return Err((cleared(jar), AppError::store("Login failed", e))),
    };

    let verified = state
        .credentials
        .verify_password(&req.password, user.password_hash.expose())
        .map_err(|e| AppError::store("Login failed", e));
    match verified {
        Ok(true) => {}
        Ok(false) => return Err((cleared(jar), AppError::AuthenticationError("Invalid password".to_string()))),
        Err(e) => return Err((cleared(jar), e)),
    }

    let token = match issue_token(&state.auth, &Identity::new(user.username.clone(), user.role)) {
        Ok(token) => token,
        Err(e) => return Err((cleared(jar), e)),
    };

    tracing::info!("User {} logged in", user.username);
    let jar = jar.add(session_cookie(&state, token.clone()));
    Ok((jar, Json(LoginResponse { message: "Successful login", token })))
}

async fn logout(jar: CookieJar) -> impl IntoResponse {
    (cleared(jar), Redirect::to("/home"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_rules() {
        let ok = validate_registration(&json!({"username": "  alice_1 ", "password": "Valid123!"})).unwrap();
        assert_eq!(ok, ("alice_1".to_string(), "Valid123!".to_string(), Role::User));

        let errors = validate_registration(&json!({"username": "al", "password": "short", "role": "root"}))
            .unwrap_err();
        assert_eq!(
            errors,
            vec![
                FieldError { field: "username", msg: "Username must have at least 4 characters" },
                FieldError { field: "password", msg: "Password must be at least 8 characters" },
                FieldError { field: "role", msg: "Must be one of: admin, user." },
            ]
        );
    }

    #[test]
    fn test_password_rules_in_order() {
        assert_eq!(password_rule("abcdefgh"), Some("Password must have a number"));
        assert_eq!(password_rule("abcdefg1"), Some("Password must have at least 1 special character"));
        assert_eq!(password_rule("abcdef1!"), None);
        assert_eq!(username_rule("bad name"), Some("Username may only contain letters, numbers, and underscores"));
    }

    #[test]
    fn test_missing_fields() {
        let errors = validate_registration(&json!({})).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.msg == MISSING));
    }
}
