/// Database models for Smart Todo
///
/// Each model carries its PostgreSQL operations as associated functions.
/// Handlers do not call these directly; they go through the storage traits in
/// [`crate::repository`], whose PostgreSQL backend delegates here.
///
/// # Models
///
/// - `user`: Registered accounts
/// - `task`: Owner-scoped tasks with tag names attached
/// - `tag`: Globally unique, lazily created tag names
///
/// # Example
///
/// ```no_run
/// use smarttodo_shared::models::user::{User, CreateUser};
/// use smarttodo_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     username: "alice".to_string(),
///     email: "alice@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod tag;
pub mod task;
pub mod user;
