/// JWT token generation and validation module
///
/// Bearer tokens carry exactly two claims: the username (`sub`) and an
/// absolute expiry (`exp`, Unix seconds). They are signed with an HMAC
/// algorithm using a server-held secret.
///
/// # Security
///
/// - **Algorithm**: HMAC (HS256 by default, HS384/HS512 accepted)
/// - **Expiration**: Chosen per token; [`default_token_ttl`] when unspecified
/// - **Validation**: Signature and expiry, with no leeway
/// - **Revocation**: None; tokens stay valid until they expire
///
/// # Example
///
/// ```
/// use smarttodo_shared::auth::jwt::{create_token, validate_token, Claims};
/// use chrono::Duration;
/// use jsonwebtoken::Algorithm;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let claims = Claims::new("alice", Duration::minutes(30));
/// let token = create_token(&claims, "your-secret-key", Algorithm::HS256)?;
///
/// let validated = validate_token(&token, "your-secret-key", Algorithm::HS256)?;
/// assert_eq!(validated.sub, "alice");
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Lifetime in minutes of a token when the caller does not ask for one
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 15;

/// Lifetime of a token when the caller does not ask for one
pub fn default_token_ttl() -> Duration {
    Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES)
}

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Algorithm is not an HMAC variant
    #[error("Unsupported signing algorithm: {0:?}")]
    UnsupportedAlgorithm(Algorithm),
}

/// JWT claims structure
///
/// - `sub`: Subject (username)
/// - `exp`: Expiration timestamp (Unix seconds)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - username of the authenticated user
    pub sub: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Creates claims expiring `expires_in` from now
    ///
    /// A zero or negative duration yields claims that are already expired.
    pub fn new(username: impl Into<String>, expires_in: Duration) -> Self {
        Self {
            sub: username.into(),
            exp: (Utc::now() + expires_in).timestamp(),
        }
    }

    /// Checks if token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

fn ensure_hmac(algorithm: Algorithm) -> Result<(), JwtError> {
    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(()),
        other => Err(JwtError::UnsupportedAlgorithm(other)),
    }
}

/// Creates a signed JWT from claims
///
/// # Errors
///
/// Returns `JwtError::UnsupportedAlgorithm` for non-HMAC algorithms and
/// `JwtError::CreateError` if encoding fails
pub fn create_token(claims: &Claims, secret: &str, algorithm: Algorithm) -> Result<String, JwtError> {
    ensure_hmac(algorithm)?;

    let header = Header::new(algorithm);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a JWT and extracts its claims
///
/// Verifies:
/// - Signature is valid for `secret` and `algorithm`
/// - `exp` is present and strictly in the future
/// - `sub` is present
///
/// # Errors
///
/// Returns `JwtError::Expired` for expired tokens and
/// `JwtError::ValidationError` for everything else
pub fn validate_token(token: &str, secret: &str, algorithm: Algorithm) -> Result<Claims, JwtError> {
    ensure_hmac(algorithm)?;

    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(algorithm);
    validation.leeway = 0;
    validation.validate_exp = true;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    // The library accepts a token whose exp equals the current second
    if token_data.claims.is_expired() {
        return Err(JwtError::Expired);
    }

    Ok(token_data.claims)
}
