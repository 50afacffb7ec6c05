/// Task model and database operations
///
/// Tasks always belong to one user. Every lookup, update and delete here is
/// filtered by both task ID and owner ID, so a task owned by someone else is
/// indistinguishable from a missing one.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id BIGSERIAL PRIMARY KEY,
///     title VARCHAR(100) NOT NULL,
///     description VARCHAR(500),
///     is_completed BOOLEAN NOT NULL DEFAULT FALSE,
///     priority INTEGER NOT NULL DEFAULT 2,
///     due_date TIMESTAMPTZ,
///     owner_id BIGINT NOT NULL REFERENCES users(id)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use smarttodo_shared::models::task::{Task, TaskFields};
/// use smarttodo_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let task = Task::create(&pool, 1, TaskFields {
///     priority: 1,
///     tags: vec!["work".to_string()],
///     ..TaskFields::new("Ship release")
/// }).await?;
///
/// let found = Task::find_for_owner(&pool, task.id, 1).await?;
/// assert!(found.is_some());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

use super::tag::Tag;

/// Priority assigned to tasks created without one
pub const DEFAULT_PRIORITY: i32 = 2;

/// Named priority levels
///
/// Tasks store priority as a plain integer; values outside 1..=3 are legal
/// but map to no named level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Level 1
    High,

    /// Level 2
    Medium,

    /// Level 3
    Low,
}

impl Priority {
    /// Maps a stored integer to its named level
    pub fn from_level(level: i32) -> Option<Self> {
        match level {
            1 => Some(Priority::High),
            2 => Some(Priority::Medium),
            3 => Some(Priority::Low),
            _ => None,
        }
    }
}

/// Task model with its tag names attached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: i64,

    /// Short title
    pub title: String,

    /// Optional longer description
    pub description: Option<String>,

    /// Completion flag
    pub is_completed: bool,

    /// Priority (1 = high, 2 = medium, 3 = low by convention)
    pub priority: i32,

    /// Optional due timestamp
    pub due_date: Option<DateTime<Utc>>,

    /// Attached tag names, sorted
    pub tags: Vec<String>,

    /// Owning user ID (immutable)
    pub owner_id: i64,
}

/// Every writable task field
///
/// Used for both creation and update; an update replaces all of them,
/// including the tag set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFields {
    /// Title
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Completion flag
    pub is_completed: bool,

    /// Priority level
    pub priority: i32,

    /// Optional due timestamp
    pub due_date: Option<DateTime<Utc>>,

    /// Tag names; unknown names are created, duplicates collapse
    pub tags: Vec<String>,
}

impl TaskFields {
    /// Fields for a pending, medium-priority, untagged task
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            is_completed: false,
            priority: DEFAULT_PRIORITY,
            due_date: None,
            tags: Vec::new(),
        }
    }
}

const SELECT_TASKS: &str = r#"
    SELECT t.id, t.title, t.description, t.is_completed, t.priority, t.due_date, t.owner_id,
           COALESCE(
               ARRAY_AGG(g.name::TEXT ORDER BY g.name) FILTER (WHERE g.id IS NOT NULL),
               '{}'::TEXT[]
           ) AS tags
    FROM tasks t
    LEFT JOIN task_tags tt ON tt.task_id = t.id
    LEFT JOIN tags g ON g.id = tt.tag_id
"#;

async fn fetch_scoped<'c, E>(executor: E, id: i64, owner_id: i64) -> Result<Option<Task>, sqlx::Error>
where
    E: PgExecutor<'c>,
{
    let sql = format!("{} WHERE t.id = $1 AND t.owner_id = $2 GROUP BY t.id", SELECT_TASKS);

    sqlx::query_as::<_, Task>(&sql)
        .bind(id)
        .bind(owner_id)
        .fetch_optional(executor)
        .await
}

impl Task {
    /// Creates a task owned by `owner_id` and attaches its tags
    ///
    /// The insert and all tag associations commit together.
    pub async fn create(pool: &PgPool, owner_id: i64, data: TaskFields) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO tasks (title, description, is_completed, priority, due_date, owner_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.is_completed)
        .bind(data.priority)
        .bind(data.due_date)
        .bind(owner_id)
        .fetch_one(&mut *tx)
        .await?;

        Tag::attach_all(&mut tx, id, &data.tags).await?;

        let task = fetch_scoped(&mut *tx, id, owner_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        tx.commit().await?;
        Ok(task)
    }

    /// Finds a task by ID, only if `owner_id` owns it
    pub async fn find_for_owner(
        pool: &PgPool,
        id: i64,
        owner_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        fetch_scoped(pool, id, owner_id).await
    }

    /// Lists a page of the owner's tasks in storage order
    pub async fn list_for_owner(
        pool: &PgPool,
        owner_id: i64,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "{} WHERE t.owner_id = $1 GROUP BY t.id ORDER BY t.id LIMIT $2 OFFSET $3",
            SELECT_TASKS
        );

        sqlx::query_as::<_, Task>(&sql)
            .bind(owner_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Lists every task of the owner in storage order
    pub async fn list_all_for_owner(pool: &PgPool, owner_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!("{} WHERE t.owner_id = $1 GROUP BY t.id ORDER BY t.id", SELECT_TASKS);

        sqlx::query_as::<_, Task>(&sql)
            .bind(owner_id)
            .fetch_all(pool)
            .await
    }

    /// Replaces every field and the whole tag set of an owned task
    ///
    /// Returns `None` without touching anything if the task does not exist or
    /// belongs to another user.
    pub async fn update_for_owner(
        pool: &PgPool,
        id: i64,
        owner_id: i64,
        data: TaskFields,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let updated: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE tasks
            SET title = $3,
                description = $4,
                is_completed = $5,
                priority = $6,
                due_date = $7
            WHERE id = $1 AND owner_id = $2
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.is_completed)
        .bind(data.priority)
        .bind(data.due_date)
        .fetch_optional(&mut *tx)
        .await?;

        if updated.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        Tag::detach_all(&mut tx, id).await?;
        Tag::attach_all(&mut tx, id, &data.tags).await?;

        let task = fetch_scoped(&mut *tx, id, owner_id).await?;

        tx.commit().await?;
        Ok(task)
    }

    /// Deletes an owned task; its tag associations cascade, its tags stay
    ///
    /// Returns whether a row was removed.
    pub async fn delete_for_owner(pool: &PgPool, id: i64, owner_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_levels() {
        assert_eq!(Priority::from_level(1), Some(Priority::High));
        assert_eq!(Priority::from_level(2), Some(Priority::Medium));
        assert_eq!(Priority::from_level(3), Some(Priority::Low));
        assert_eq!(Priority::from_level(0), None);
        assert_eq!(Priority::from_level(4), None);
        assert_eq!(Priority::from_level(-1), None);
    }

    #[test]
    fn test_task_fields_defaults() {
        let fields = TaskFields::new("Write report");

        assert_eq!(fields.title, "Write report");
        assert!(fields.description.is_none());
        assert!(!fields.is_completed);
        assert_eq!(fields.priority, DEFAULT_PRIORITY);
        assert_eq!(fields.priority, 2);
        assert!(fields.due_date.is_none());
        assert!(fields.tags.is_empty());
    }

    #[test]
    fn test_task_serializes_tags_as_names() {
        let task = Task {
            id: 3,
            title: "t".to_string(),
            description: None,
            is_completed: false,
            priority: 1,
            due_date: None,
            tags: vec!["a".to_string(), "b".to_string()],
            owner_id: 9,
        };

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["tags"], serde_json::json!(["a", "b"]));
        assert_eq!(json["owner_id"], 9);
        assert!(json["due_date"].is_null());
    }
}
