use crate::{
    credo::handlers::{acceptable_password, ApiError, Message},
    store::{identifier::valid_identifier, SharedStore},
};
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, instrument};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize)]
pub struct UserLogin {
    #[serde(alias = "username")]
    identifier: String,
    password: String,
}

impl fmt::Debug for UserLogin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserLogin")
            .field("identifier", &self.identifier)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[utoipa::path(
    post,
    path= "/login",
    request_body = UserLogin,
    responses (
        (status = 200, description = "Login successful", body = Message, content_type = "application/json"),
        (status = 400, description = "Invalid input", body = Message),
        (status = 401, description = "Unknown identifier or wrong password", body = Message),
        (status = 500, description = "Internal server error", body = Message),
    ),
    tag= "login"
)]
// axum handler for login
#[instrument(skip(store))]
pub async fn login(
    store: Extension<SharedStore>,
    payload: Option<Json<UserLogin>>,
) -> impl IntoResponse {
    let user: UserLogin = match payload {
        Some(Json(payload)) => payload,
        None => return ApiError::BadRequest("Missing payload").into_response(),
    };

    debug!("user: {:?}", user);

    if !valid_identifier(&user.identifier) {
        debug!("Rejected login: invalid identifier");

        return ApiError::BadRequest("Invalid identifier").into_response();
    }

    if !acceptable_password(&user.password) {
        debug!("Rejected login: unacceptable password");

        return ApiError::BadRequest("Invalid password").into_response();
    }

    let password = SecretString::from(user.password);

    // unknown identifiers and wrong passwords are indistinguishable to the caller
    match store.verify(&user.identifier, &password).await {
        Ok(true) => {
            debug!("Login successful");

            (StatusCode::OK, Json(Message::new("Login successful"))).into_response()
        }
        Ok(false) => {
            debug!("Unauthorized");

            ApiError::Unauthorized.into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}
