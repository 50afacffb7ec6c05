//! PostgreSQL storage backend.

use async_trait::async_trait;
use sqlx::PgPool;

use super::{Store, StoreError, StoreResult, TaskRepository, UserRepository};
use crate::db::pool::health_check;
use crate::models::tag::Tag;
use crate::models::task::{Task, TaskFields};
use crate::models::user::{CreateUser, User};

/// Name of the unique constraint on `users.username`.
pub const USERNAME_CONSTRAINT: &str = "users_username_key";

/// Name of the unique constraint on `users.email`.
pub const EMAIL_CONSTRAINT: &str = "users_email_key";

/// Store backed by a PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wraps an existing pool. Migrations must already have run.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn map_user_insert_error(err: sqlx::Error, username: String, email: String) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            match db_err.constraint() {
                Some(USERNAME_CONSTRAINT) => return StoreError::DuplicateUsername(username),
                Some(EMAIL_CONSTRAINT) => return StoreError::DuplicateEmail(email),
                _ => {}
            }
        }
    }

    StoreError::backend(err)
}

#[async_trait]
impl UserRepository for PgStore {
    async fn insert_user(&self, user: CreateUser) -> StoreResult<User> {
        let username = user.username.clone();
        let email = user.email.clone();

        User::create(&self.pool, user)
            .await
            .map_err(|err| map_user_insert_error(err, username, email))
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        User::find_by_username(&self.pool, username)
            .await
            .map_err(StoreError::backend)
    }
}

#[async_trait]
impl TaskRepository for PgStore {
    async fn create_task(&self, owner_id: i64, fields: TaskFields) -> StoreResult<Task> {
        tracing::debug!(owner_id, tags = fields.tags.len(), "Creating task");

        Task::create(&self.pool, owner_id, fields)
            .await
            .map_err(StoreError::backend)
    }

    async fn get_task(&self, task_id: i64, owner_id: i64) -> StoreResult<Option<Task>> {
        Task::find_for_owner(&self.pool, task_id, owner_id)
            .await
            .map_err(StoreError::backend)
    }

    async fn list_tasks(&self, owner_id: i64, offset: u32, limit: u32) -> StoreResult<Vec<Task>> {
        Task::list_for_owner(&self.pool, owner_id, i64::from(offset), i64::from(limit))
            .await
            .map_err(StoreError::backend)
    }

    async fn list_all_tasks(&self, owner_id: i64) -> StoreResult<Vec<Task>> {
        Task::list_all_for_owner(&self.pool, owner_id)
            .await
            .map_err(StoreError::backend)
    }

    async fn update_task(
        &self,
        task_id: i64,
        owner_id: i64,
        fields: TaskFields,
    ) -> StoreResult<Option<Task>> {
        tracing::debug!(task_id, owner_id, "Updating task");

        Task::update_for_owner(&self.pool, task_id, owner_id, fields)
            .await
            .map_err(StoreError::backend)
    }

    async fn delete_task(&self, task_id: i64, owner_id: i64) -> StoreResult<bool> {
        Task::delete_for_owner(&self.pool, task_id, owner_id)
            .await
            .map_err(StoreError::backend)
    }

    async fn find_tag(&self, name: &str) -> StoreResult<Option<Tag>> {
        Tag::find_by_name(&self.pool, name)
            .await
            .map_err(StoreError::backend)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        health_check(&self.pool).await.map_err(StoreError::backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_unique_errors_stay_backend() {
        let err = map_user_insert_error(sqlx::Error::RowNotFound, "alice".into(), "a@x.io".into());
        assert!(matches!(err, StoreError::Backend(_)));
        assert!(!err.is_duplicate());
    }
}
