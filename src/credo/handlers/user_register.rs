use crate::{
    credo::handlers::{valid_password, ApiError, Message},
    store::{identifier::valid_identifier, SharedStore},
};
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize)]
pub struct UserRegister {
    #[serde(alias = "username")]
    identifier: String,
    password: String,
}

impl fmt::Debug for UserRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRegister")
            .field("identifier", &self.identifier)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[utoipa::path(
    post,
    path= "/register",
    request_body = UserRegister,
    responses (
        (status = 200, description = "Account created", body = Message, content_type = "application/json"),
        (status = 400, description = "Invalid input, password policy unmet or identifier already exists", body = Message),
        (status = 500, description = "Internal server error", body = Message),
    ),
    tag= "register"
)]
// axum handler for register
#[instrument(skip(store))]
pub async fn register(
    store: Extension<SharedStore>,
    payload: Option<Json<UserRegister>>,
) -> impl IntoResponse {
    let user: UserRegister = match payload {
        Some(Json(payload)) => payload,
        None => return ApiError::BadRequest("Missing payload").into_response(),
    };

    debug!("user: {:?}", user);

    if !valid_identifier(&user.identifier) {
        return ApiError::BadRequest("Invalid identifier").into_response();
    }

    if !valid_password(&user.password) {
        return ApiError::BadRequest(
            "Password must be at least 8 characters with an uppercase letter and a digit",
        )
        .into_response();
    }

    let password = SecretString::from(user.password);

    match store.insert(&user.identifier, &password).await {
        Ok(()) => {
            info!("Account created: {}", user.identifier);

            (StatusCode::OK, Json(Message::new("Account created"))).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}
