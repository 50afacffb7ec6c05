/// Credential store and verifier
///
/// Ties the user repository, password hashing and JWT handling together:
///
/// - [`CredentialStore::register`] hashes the password and stores a new user
/// - [`CredentialStore::authenticate`] checks a username/password pair
/// - [`CredentialStore::issue_token`] signs a `{sub, exp}` bearer token
/// - [`CredentialStore::resolve`] turns a bearer token back into a user
///
/// Every token failure (bad signature, expiry, missing subject, unknown
/// user) collapses into [`CredentialError::Unauthenticated`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use smarttodo_shared::auth::credentials::{AuthConfig, CredentialStore};
/// use smarttodo_shared::repository::memory::MemoryStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = AuthConfig::new("a-secret-that-is-at-least-32-bytes!!");
/// let credentials = CredentialStore::new(config, Arc::new(MemoryStore::new()));
///
/// credentials.register("alice", "alice@example.com", "pw").await?;
/// let user = credentials.authenticate("alice", "pw").await?.expect("valid login");
///
/// let token = credentials.issue_token(&user.username, None)?;
/// let resolved = credentials.resolve(&token).await?;
/// assert_eq!(resolved.id, user.id);
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::Algorithm;

use super::jwt::{self, default_token_ttl, Claims, JwtError};
use super::password::{self, PasswordError, PasswordParams};
use crate::models::user::{CreateUser, User};
use crate::repository::{StoreError, UserRepository};

/// Hashing parameters and signing settings, built once at startup
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC signing secret
    pub secret: String,

    /// Signing algorithm (HS256 unless configured otherwise)
    pub algorithm: Algorithm,

    /// Lifetime of tokens handed out by the login endpoint
    pub access_token_ttl: Duration,

    /// Argon2id cost for new password hashes
    pub password: PasswordParams,
}

impl AuthConfig {
    /// HS256 signing with a 30 minute login token and default hashing cost
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            algorithm: Algorithm::HS256,
            access_token_ttl: Duration::minutes(30),
            password: PasswordParams::default(),
        }
    }
}

/// Errors returned by the credential store
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// Username or email is already registered
    #[error("{0}")]
    AlreadyExists(String),

    /// Token is missing, invalid, expired, or names no existing user
    #[error("Could not validate credentials")]
    Unauthenticated,

    /// Password hashing failed
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// Token signing failed
    #[error(transparent)]
    Token(#[from] JwtError),

    /// The user store failed
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for CredentialError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUsername(_) => {
                CredentialError::AlreadyExists("Username already registered".to_string())
            }
            StoreError::DuplicateEmail(_) => {
                CredentialError::AlreadyExists("Email already registered".to_string())
            }
            other => CredentialError::Store(other),
        }
    }
}

/// Credential store over any [`UserRepository`]
#[derive(Clone)]
pub struct CredentialStore {
    config: Arc<AuthConfig>,
    users: Arc<dyn UserRepository>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("algorithm", &self.config.algorithm)
            .field("access_token_ttl", &self.config.access_token_ttl)
            .finish_non_exhaustive()
    }
}

impl CredentialStore {
    /// Creates a credential store
    pub fn new(config: AuthConfig, users: Arc<dyn UserRepository>) -> Self {
        Self {
            config: Arc::new(config),
            users,
        }
    }

    /// Registers a new user, storing only the password hash
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::AlreadyExists` if the username is taken. The
    /// existing user is left untouched.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, CredentialError> {
        if self.users.find_user_by_username(username).await?.is_some() {
            tracing::debug!(username, "Registration rejected: username taken");
            return Err(CredentialError::AlreadyExists(
                "Username already registered".to_string(),
            ));
        }

        let password_hash = password::hash_password_with(password, &self.config.password)?;

        let user = self
            .users
            .insert_user(CreateUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await?;

        tracing::info!(user_id = user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Checks a username/password pair
    ///
    /// Returns `Ok(None)` both for an unknown username and for a wrong
    /// password.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, CredentialError> {
        let Some(user) = self.users.find_user_by_username(username).await? else {
            tracing::debug!(username, "Login failed: unknown user");
            return Ok(None);
        };

        match password::verify_password(password, &user.password_hash) {
            Ok(true) => Ok(Some(user)),
            Ok(false) => {
                tracing::debug!(username, "Login failed: wrong password");
                Ok(None)
            }
            Err(e) => {
                tracing::warn!(username, error = %e, "Stored password hash could not be checked");
                Ok(None)
            }
        }
    }

    /// Signs a token for `username`
    ///
    /// Uses [`default_token_ttl`] when `ttl` is `None`. A zero or negative
    /// ttl produces a token that never resolves.
    pub fn issue_token(&self, username: &str, ttl: Option<Duration>) -> Result<String, CredentialError> {
        let claims = Claims::new(username, ttl.unwrap_or_else(default_token_ttl));
        let token = jwt::create_token(&claims, &self.config.secret, self.config.algorithm)?;
        Ok(token)
    }

    /// Signs a token with the configured login lifetime
    pub fn issue_access_token(&self, username: &str) -> Result<String, CredentialError> {
        self.issue_token(username, Some(self.config.access_token_ttl))
    }

    /// Resolves a bearer token to its user
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::Unauthenticated` for every token or subject
    /// failure, and `CredentialError::Store` only if the lookup itself fails.
    pub async fn resolve(&self, token: &str) -> Result<User, CredentialError> {
        let claims = jwt::validate_token(token, &self.config.secret, self.config.algorithm)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected bearer token");
                CredentialError::Unauthenticated
            })?;

        if claims.sub.is_empty() {
            return Err(CredentialError::Unauthenticated);
        }

        self.users
            .find_user_by_username(&claims.sub)
            .await
            .map_err(CredentialError::Store)?
            .ok_or(CredentialError::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::memory::MemoryStore;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn store() -> CredentialStore {
        let mut config = AuthConfig::new(SECRET);
        config.password = PasswordParams {
            memory_kib: 4096,
            iterations: 1,
            parallelism: 1,
        };
        CredentialStore::new(config, Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_register_stores_hash_not_plaintext() {
        let credentials = store();
        let user = credentials
            .register("alice", "alice@example.com", "s3cret")
            .await
            .unwrap();

        assert_eq!(user.username, "alice");
        assert!(user.password_hash.starts_with("$argon2id$"));
        assert!(!user.password_hash.contains("s3cret"));
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let credentials = store();
        let first = credentials
            .register("alice", "alice@example.com", "first")
            .await
            .unwrap();

        let err = credentials
            .register("alice", "other@example.com", "second")
            .await
            .unwrap_err();
        assert!(matches!(err, CredentialError::AlreadyExists(_)));

        let user = credentials.authenticate("alice", "first").await.unwrap().unwrap();
        assert_eq!(user.id, first.id);
        assert_eq!(user.email, "alice@example.com");
        assert!(credentials.authenticate("alice", "second").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let credentials = store();
        credentials
            .register("alice", "shared@example.com", "pw")
            .await
            .unwrap();

        let err = credentials
            .register("bob", "shared@example.com", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, CredentialError::AlreadyExists(msg) if msg.contains("Email")));
    }

    #[tokio::test]
    async fn test_authenticate_fails_closed() {
        let credentials = store();
        credentials
            .register("alice", "alice@example.com", "right")
            .await
            .unwrap();

        assert!(credentials.authenticate("alice", "wrong").await.unwrap().is_none());
        assert!(credentials.authenticate("nobody", "right").await.unwrap().is_none());
        assert!(credentials.authenticate("alice", "right").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_token_resolves_to_user() {
        let credentials = store();
        let user = credentials
            .register("alice", "alice@example.com", "pw")
            .await
            .unwrap();

        let token = credentials.issue_access_token("alice").unwrap();
        let resolved = credentials.resolve(&token).await.unwrap();
        assert_eq!(resolved, user);
    }

    #[tokio::test]
    async fn test_zero_ttl_token_never_resolves() {
        let credentials = store();
        credentials
            .register("alice", "alice@example.com", "pw")
            .await
            .unwrap();

        let token = credentials.issue_token("alice", Some(Duration::zero())).unwrap();
        assert!(matches!(
            credentials.resolve(&token).await,
            Err(CredentialError::Unauthenticated)
        ));

        let past = credentials
            .issue_token("alice", Some(Duration::minutes(-5)))
            .unwrap();
        assert!(matches!(
            credentials.resolve(&past).await,
            Err(CredentialError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_unknown_subject_is_unauthenticated() {
        let credentials = store();
        let token = credentials.issue_token("ghost", None).unwrap();

        assert!(matches!(
            credentials.resolve(&token).await,
            Err(CredentialError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_foreign_secret_is_unauthenticated() {
        let credentials = store();
        credentials
            .register("alice", "alice@example.com", "pw")
            .await
            .unwrap();

        let other = CredentialStore::new(
            AuthConfig::new("another-secret-key-also-32-bytes-long!"),
            Arc::new(MemoryStore::new()),
        );
        let forged = other.issue_token("alice", None).unwrap();

        assert!(matches!(
            credentials.resolve(&forged).await,
            Err(CredentialError::Unauthenticated)
        ));
        assert!(matches!(
            credentials.resolve("garbage").await,
            Err(CredentialError::Unauthenticated)
        ));
    }
}
