/// Authentication utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: Signed, time-limited bearer tokens
/// - [`credentials`]: The credential store tying users, hashes and tokens together
///
/// # Example
///
/// ```
/// use smarttodo_shared::auth::password::{hash_password, verify_password};
/// use smarttodo_shared::auth::jwt::{create_token, validate_token, Claims};
/// use chrono::Duration;
/// use jsonwebtoken::Algorithm;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let claims = Claims::new("alice", Duration::minutes(15));
/// let token = create_token(&claims, "secret-key", Algorithm::HS256)?;
/// let validated = validate_token(&token, "secret-key", Algorithm::HS256)?;
/// assert_eq!(validated.sub, "alice");
/// # Ok(())
/// # }
/// ```

pub mod credentials;
pub mod jwt;
pub mod password;
