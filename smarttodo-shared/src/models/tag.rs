/// Tag model and database operations
///
/// Tags are shared across all users and deduplicated by exact name. They are
/// created lazily when a task references an unknown name and are never deleted.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tags (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(50) NOT NULL UNIQUE
/// );
///
/// CREATE TABLE task_tags (
///     task_id BIGINT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     tag_id BIGINT NOT NULL REFERENCES tags(id),
///     PRIMARY KEY (task_id, tag_id)
/// );
/// ```

use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use std::collections::BTreeSet;

/// A globally unique tag name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    /// Unique tag ID
    pub id: i64,

    /// Unique tag name
    pub name: String,
}

/// Removes duplicate names and sorts the rest
///
/// Upserting in this order means concurrent transactions lock tag rows in the
/// same sequence and cannot deadlock on each other.
pub fn sorted_unique_names(names: &[String]) -> Vec<String> {
    names
        .iter()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

impl Tag {
    /// Returns the tag with `name`, inserting it first if it does not exist
    ///
    /// The upsert relies on the unique constraint on `tags.name`, so two
    /// concurrent callers introducing the same name both get the same row.
    pub async fn find_or_create(conn: &mut PgConnection, name: &str) -> Result<Self, sqlx::Error> {
        let tag = sqlx::query_as::<_, Tag>(
            r#"
            INSERT INTO tags (name)
            VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name
            "#,
        )
        .bind(name)
        .fetch_one(conn)
        .await?;

        Ok(tag)
    }

    /// Finds a tag by exact name
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Self>, sqlx::Error> {
        let tag = sqlx::query_as::<_, Tag>("SELECT id, name FROM tags WHERE name = $1")
            .bind(name)
            .fetch_optional(pool)
            .await?;

        Ok(tag)
    }

    /// Attaches every named tag to a task, creating unknown tags
    ///
    /// Names are upserted in sorted order whatever order the caller gave.
    pub async fn attach_all(
        conn: &mut PgConnection,
        task_id: i64,
        names: &[String],
    ) -> Result<(), sqlx::Error> {
        for name in sorted_unique_names(names) {
            let tag = Tag::find_or_create(&mut *conn, &name).await?;

            sqlx::query(
                r#"
                INSERT INTO task_tags (task_id, tag_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(task_id)
            .bind(tag.id)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    /// Detaches every tag from a task; the tags themselves are kept
    pub async fn detach_all(conn: &mut PgConnection, task_id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM task_tags WHERE task_id = $1")
            .bind(task_id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected())
    }
}
