/// Common test utilities for integration tests
///
/// Builds the full router over an in-memory store with cheap password
/// hashing, and wraps request/response plumbing.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use smarttodo_api::app::{build_router, AppState};
use smarttodo_api::config::{ApiConfig, Config, JwtConfig, StorageBackend, StorageConfig};
use smarttodo_shared::auth::password::PasswordParams;
use smarttodo_shared::repository::memory::MemoryStore;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Test context holding a router over a fresh store
pub struct TestContext {
    pub app: Router,
    pub store: MemoryStore,
}

/// Decoded response
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
        },
        storage: StorageConfig {
            backend: StorageBackend::Memory,
            database_url: None,
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            access_token_expire_minutes: 30,
        },
    }
}

impl TestContext {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let state = AppState::with_password_params(
            store.clone(),
            test_config(),
            PasswordParams {
                memory_kib: 4096,
                iterations: 1,
                parallelism: 1,
            },
        );

        Self {
            app: build_router(state),
            store,
        }
    }

    /// Sends a request through the router
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Sends a JSON request, optionally with a bearer token
    pub async fn json(&self, method: &str, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap()).await
    }

    /// Sends a bodiless request, optionally with a bearer token
    pub async fn empty(&self, method: &str, uri: &str, token: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    /// Posts the login form
    pub async fn login(&self, username: &str, password: &str) -> TestResponse {
        let form = format!("username={}&password={}", username, password);
        let request = Request::builder()
            .method("POST")
            .uri("/token/")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form))
            .unwrap();
        self.send(request).await
    }

    /// Registers a user and returns its JSON
    pub async fn register(&self, username: &str, password: &str) -> Value {
        let response = self
            .json(
                "POST",
                "/register/",
                None,
                serde_json::json!({
                    "username": username,
                    "email": format!("{}@example.com", username),
                    "password": password,
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "register failed: {}", response.body);
        response.body
    }

    /// Registers a user and logs in, returning a bearer token
    pub async fn user_token(&self, username: &str) -> String {
        self.register(username, "password123").await;
        let response = self.login(username, "password123").await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.body);
        response.body["access_token"].as_str().unwrap().to_string()
    }
}
