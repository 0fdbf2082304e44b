use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use flickbook_booking::AccessError;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(String),
    /// 400 with an itemized `errors` list next to the message.
    InvalidPayload {
        message: String,
        errors: serde_json::Value,
    },
    NotFoundError(String),
    ConflictError(String),
    /// Unauthenticated visit to an admin page: send the browser home.
    LoginRedirect,
    /// A failed write or read. `message` is returned, `detail` only logged.
    StoreError {
        message: &'static str,
        detail: String,
    },
    InternalServerError(String),
}

impl AppError {
    pub fn store(message: &'static str, err: impl std::fmt::Display) -> Self {
        AppError::StoreError {
            message,
            detail: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg, None),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::InvalidPayload { message, errors } => (StatusCode::BAD_REQUEST, message, Some(errors)),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg, None),
            AppError::LoginRedirect => return Redirect::to("/home").into_response(),
            AppError::StoreError { message, detail } => {
                tracing::error!("{}: {}", message, detail);
                (StatusCode::INTERNAL_SERVER_ERROR, message.to_string(), None)
            }
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string(), None)
            }
        };

        let body = match errors {
            Some(errors) => json!({ "message": message, "errors": errors }),
            None => json!({ "message": message }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<AccessError> for AppError {
    fn from(err: AccessError) -> Self {
        let message = err.to_string();
        match err {
            AccessError::Unauthenticated => AppError::AuthenticationError(message),
            AccessError::AdminRequired | AccessError::Forbidden(_) => AppError::AuthorizationError(message),
            AccessError::NotFound => AppError::NotFoundError(message),
            AccessError::Store(e) => AppError::store("Failed to load booking", e),
        }
    }
}
