pub mod health;
pub use self::health::health;

pub mod index;
pub use self::index::index;

pub mod user_register;
pub use self::user_register::register;

pub mod user_login;
pub use self::user_login::login;

// common functions for the handlers
use crate::store::{password::MAX_PASSWORD_BYTES, StoreError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

pub const PASSWORD_MIN_CHARS: usize = 8;

/// JSON body of every `/login` and `/register` response.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Registration policy: 8+ characters, one uppercase letter, one digit, and
/// no more than bcrypt will actually hash.
pub fn valid_password(password: &str) -> bool {
    password.chars().count() >= PASSWORD_MIN_CHARS
        && password.len() <= MAX_PASSWORD_BYTES
        && Regex::new(r"[A-Z]").is_ok_and(|re| re.is_match(password))
        && Regex::new(r"[0-9]").is_ok_and(|re| re.is_match(password))
}

/// Shape check for login: anything bcrypt can take.
pub fn acceptable_password(password: &str) -> bool {
    !password.is_empty() && password.len() <= MAX_PASSWORD_BYTES
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(&'static str),
    Unauthorized,
    Storage(StoreError),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidIdentifier => Self::BadRequest("Invalid identifier"),
            StoreError::Duplicate => Self::BadRequest("Identifier already exists"),
            other => Self::Storage(other),
        }
    }
}

impl IntoResponse for ApiError {
    /// Storage failures are logged server-side and surfaced as a generic `500`.
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(Message::new(message))).into_response()
            }
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(Message::new("Invalid identifier or password")),
            )
                .into_response(),
            Self::Storage(err) => {
                error!("Credential store error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(Message::new("Internal server error")),
                )
                    .into_response()
            }
        }
    }
}
