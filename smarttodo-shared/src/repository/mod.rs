//! Storage traits for users, tasks and tags.
//!
//! Handlers and the credential store only see these traits. Two backends
//! implement them:
//!
//! - [`postgres::PgStore`]: the production backend, delegating to the model
//!   functions in [`crate::models`]
//! - [`memory::MemoryStore`]: a process-local backend used by tests and by
//!   `STORAGE_BACKEND=memory`

use async_trait::async_trait;
use thiserror::Error;

use crate::models::tag::Tag;
use crate::models::task::{Task, TaskFields};
use crate::models::user::{CreateUser, User};

pub mod memory;
pub mod postgres;

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by storage backends.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A user with the same username already exists.
    #[error("username already registered: {0}")]
    DuplicateUsername(String),

    /// A user with the same email already exists.
    #[error("email already registered: {0}")]
    DuplicateEmail(String),

    /// Backend failure (connection loss, query error, poisoned lock).
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Wraps any backend failure.
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }

    /// Whether this error reports an already-taken unique value.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateUsername(_) | Self::DuplicateEmail(_))
    }
}

/// User persistence contract.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Stores a new user.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateUsername`] or
    /// [`StoreError::DuplicateEmail`] when either value is taken.
    async fn insert_user(&self, user: CreateUser) -> StoreResult<User>;

    /// Finds a user by exact username.
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
}

/// Owner-scoped task persistence contract.
///
/// Every operation taking a task ID also takes the acting owner's ID; a task
/// owned by someone else behaves exactly like a missing one.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Creates a task, reusing or creating each named tag.
    async fn create_task(&self, owner_id: i64, fields: TaskFields) -> StoreResult<Task>;

    /// Fetches an owned task.
    async fn get_task(&self, task_id: i64, owner_id: i64) -> StoreResult<Option<Task>>;

    /// Lists a page of the owner's tasks in ascending ID order.
    async fn list_tasks(&self, owner_id: i64, offset: u32, limit: u32) -> StoreResult<Vec<Task>>;

    /// Lists every task of the owner in ascending ID order.
    async fn list_all_tasks(&self, owner_id: i64) -> StoreResult<Vec<Task>>;

    /// Replaces every field and the tag set of an owned task.
    ///
    /// Returns `None` when the task is missing or foreign.
    async fn update_task(
        &self,
        task_id: i64,
        owner_id: i64,
        fields: TaskFields,
    ) -> StoreResult<Option<Task>>;

    /// Deletes an owned task, returning whether one was removed.
    async fn delete_task(&self, task_id: i64, owner_id: i64) -> StoreResult<bool>;

    /// Finds a tag by exact name.
    async fn find_tag(&self, name: &str) -> StoreResult<Option<Tag>>;
}

/// A complete storage backend.
#[async_trait]
pub trait Store: UserRepository + TaskRepository {
    /// Checks that the backend is reachable.
    async fn ping(&self) -> StoreResult<()>;
}
