/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /register/` - Register new user (JSON body)
/// - `POST /token/` - Login with a form body and get a bearer token

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        State,
    },
    Form, Json,
};
use serde::{Deserialize, Serialize};
use smarttodo_shared::models::user::User;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Unique login name
    #[validate(length(min = 1, max = 50, message = "Username must be 1-50 characters"))]
    pub username: String,

    /// Email address
    #[validate(
        email(message = "Invalid email format"),
        length(max = 100, message = "Email must be at most 100 characters")
    )]
    pub email: String,

    /// Plaintext password, hashed before storage
    pub password: String,
}

/// Login form (`application/x-www-form-urlencoded`)
///
/// Extra OAuth2 password-flow fields such as `grant_type` and `scope` are
/// ignored.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Token response
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Signed bearer token
    pub access_token: String,

    /// Always `"bearer"`
    pub token_type: String,
}

/// Register a new user
///
/// ```text
/// POST /register/
/// Content-Type: application/json
///
/// {"username": "alice", "email": "alice@example.com", "password": "..."}
/// ```
///
/// Responds with `{id, username, email}`.
///
/// # Errors
///
/// - `400 Bad Request`: Username or email already registered
/// - `422 Unprocessable Entity`: Malformed body or invalid fields
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<Json<User>> {
    let Json(req) = payload?;
    req.validate()?;

    let user = state
        .credentials
        .register(&req.username, &req.email, &req.password)
        .await?;

    Ok(Json(user))
}

/// Login endpoint
///
/// ```text
/// POST /token/
/// Content-Type: application/x-www-form-urlencoded
///
/// username=alice&password=...
/// ```
///
/// Responds with `{"access_token": "eyJ...", "token_type": "bearer"}`.
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown user or wrong password (indistinguishable)
/// - `422 Unprocessable Entity`: Missing form fields
pub async fn login(
    State(state): State<AppState>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> ApiResult<Json<TokenResponse>> {
    let Form(form) = form?;

    let user = state
        .credentials
        .authenticate(&form.username, &form.password)
        .await?
        .ok_or_else(|| {
            tracing::warn!(username = %form.username, "Failed login attempt");
            ApiError::Unauthorized("Incorrect username or password".to_string())
        })?;

    let access_token = state.credentials.issue_access_token(&user.username)?;
    tracing::debug!(user_id = user.id, "Issued access token");

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}
