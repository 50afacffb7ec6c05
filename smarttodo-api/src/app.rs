/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use smarttodo_api::{app::{build_router, AppState}, config::Config};
/// use smarttodo_shared::repository::memory::MemoryStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(MemoryStore::new(), config);
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use chrono::Duration;
use smarttodo_shared::auth::credentials::{AuthConfig, CredentialStore};
use smarttodo_shared::auth::password::PasswordParams;
use smarttodo_shared::repository::{Store, UserRepository};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Storage backend
    pub store: Arc<dyn Store>,

    /// Password and token handling
    pub credentials: CredentialStore,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates application state with the default password hashing cost
    pub fn new<S: Store + 'static>(store: S, config: Config) -> Self {
        Self::with_password_params(store, config, PasswordParams::default())
    }

    /// Creates application state with explicit password hashing cost
    pub fn with_password_params<S: Store + 'static>(
        store: S,
        config: Config,
        password: PasswordParams,
    ) -> Self {
        let store = Arc::new(store);
        let users: Arc<dyn UserRepository> = store.clone();

        let auth = AuthConfig {
            access_token_ttl: Duration::minutes(config.jwt.access_token_expire_minutes),
            password,
            ..AuthConfig::new(config.jwt.secret.clone())
        };

        Self {
            store,
            credentials: CredentialStore::new(auth, users),
            config: Arc::new(config),
        }
    }
}

/// Identity of the caller on protected routes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    /// Authenticated user's ID
    pub user_id: i64,

    /// Authenticated user's username
    pub username: String,
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET    /                     # Welcome message (public)
/// ├── GET    /health               # Storage probe (public)
/// ├── POST   /register/            # Create account (public)
/// ├── POST   /token/               # Form login, returns bearer token (public)
/// └── /tasks/                      # Bearer token required
///     ├── POST   /tasks/
///     ├── GET    /tasks/           # ?skip=0&limit=100
///     ├── GET    /tasks/stats/
///     ├── GET    /tasks/:task_id
///     ├── PUT    /tasks/:task_id
///     └── DELETE /tasks/:task_id
/// ```
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let public_routes = Router::new()
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health_check))
        .route("/register/", post(routes::auth::register))
        .route("/token/", post(routes::auth::login));

    // route_layer keeps unknown paths as 404 instead of 401
    let task_routes = Router::new()
        .route(
            "/tasks/",
            post(routes::tasks::create_task).get(routes::tasks::list_tasks),
        )
        .route("/tasks/stats/", get(routes::tasks::task_stats))
        .route(
            "/tasks/:task_id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(public_routes)
        .merge(task_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Bearer token middleware
///
/// Resolves the token to a user and injects [`AuthContext`] into request
/// extensions. Every failure is a 401.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .map(str::to_owned)
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

    let user = state.credentials.resolve(&token).await?;

    req.extensions_mut().insert(AuthContext {
        user_id: user.id,
        username: user.username,
    });

    Ok(next.run(req).await)
}

/// Extracts the token from an `Authorization: Bearer <token>` value
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("Basic dXNlcjpwdw=="), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Bearer"), None);
    }
}
