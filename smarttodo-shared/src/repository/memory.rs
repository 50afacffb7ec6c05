//! In-memory storage backend.
//!
//! All state sits behind one lock, so every mutation (including lazy tag
//! creation) is serialized. IDs are assigned from per-table counters starting
//! at 1, matching `BIGSERIAL`.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{Store, StoreError, StoreResult, TaskRepository, UserRepository};
use crate::models::tag::Tag;
use crate::models::task::{Task, TaskFields};
use crate::models::user::{CreateUser, User};

/// Thread-safe in-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    users: BTreeMap<i64, User>,
    username_index: HashMap<String, i64>,
    email_index: HashMap<String, i64>,
    tasks: BTreeMap<i64, Task>,
    tags: HashMap<String, Tag>,
    next_user_id: i64,
    next_task_id: i64,
    next_tag_id: i64,
}

impl MemoryState {
    /// Resolves every name to a tag, creating missing ones; returns sorted,
    /// deduplicated names.
    fn intern_tags(&mut self, names: &[String]) -> Vec<String> {
        let mut interned = BTreeSet::new();
        for name in names {
            if !self.tags.contains_key(name) {
                self.next_tag_id += 1;
                let tag = Tag {
                    id: self.next_tag_id,
                    name: name.clone(),
                };
                self.tags.insert(name.clone(), tag);
            }
            interned.insert(name.clone());
        }
        interned.into_iter().collect()
    }
}

fn owned(task: &Task, owner_id: i64) -> bool {
    task.owner_id == owner_id
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, MemoryState>> {
        self.state
            .read()
            .map_err(|err| StoreError::backend(format!("memory store lock poisoned: {err}")))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, MemoryState>> {
        self.state
            .write()
            .map_err(|err| StoreError::backend(format!("memory store lock poisoned: {err}")))
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, user: CreateUser) -> StoreResult<User> {
        let mut state = self.write()?;

        if state.username_index.contains_key(&user.username) {
            return Err(StoreError::DuplicateUsername(user.username));
        }
        if state.email_index.contains_key(&user.email) {
            return Err(StoreError::DuplicateEmail(user.email));
        }

        state.next_user_id += 1;
        let stored = User {
            id: state.next_user_id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
        };

        state.username_index.insert(stored.username.clone(), stored.id);
        state.email_index.insert(stored.email.clone(), stored.id);
        state.users.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let state = self.read()?;
        let user = state
            .username_index
            .get(username)
            .and_then(|id| state.users.get(id))
            .cloned();
        Ok(user)
    }
}

#[async_trait]
impl TaskRepository for MemoryStore {
    async fn create_task(&self, owner_id: i64, fields: TaskFields) -> StoreResult<Task> {
        let mut state = self.write()?;

        let tags = state.intern_tags(&fields.tags);
        state.next_task_id += 1;
        let task = Task {
            id: state.next_task_id,
            title: fields.title,
            description: fields.description,
            is_completed: fields.is_completed,
            priority: fields.priority,
            due_date: fields.due_date,
            tags,
            owner_id,
        };

        state.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn get_task(&self, task_id: i64, owner_id: i64) -> StoreResult<Option<Task>> {
        let state = self.read()?;
        Ok(state
            .tasks
            .get(&task_id)
            .filter(|task| owned(task, owner_id))
            .cloned())
    }

    async fn list_tasks(&self, owner_id: i64, offset: u32, limit: u32) -> StoreResult<Vec<Task>> {
        let state = self.read()?;
        Ok(state
            .tasks
            .values()
            .filter(|task| owned(task, owner_id))
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn list_all_tasks(&self, owner_id: i64) -> StoreResult<Vec<Task>> {
        let state = self.read()?;
        Ok(state
            .tasks
            .values()
            .filter(|task| owned(task, owner_id))
            .cloned()
            .collect())
    }

    async fn update_task(
        &self,
        task_id: i64,
        owner_id: i64,
        fields: TaskFields,
    ) -> StoreResult<Option<Task>> {
        let mut state = self.write()?;

        let exists = state
            .tasks
            .get(&task_id)
            .is_some_and(|task| owned(task, owner_id));
        if !exists {
            return Ok(None);
        }

        let tags = state.intern_tags(&fields.tags);
        let Some(task) = state.tasks.get_mut(&task_id) else {
            return Ok(None);
        };

        task.title = fields.title;
        task.description = fields.description;
        task.is_completed = fields.is_completed;
        task.priority = fields.priority;
        task.due_date = fields.due_date;
        task.tags = tags;

        Ok(Some(task.clone()))
    }

    async fn delete_task(&self, task_id: i64, owner_id: i64) -> StoreResult<bool> {
        let mut state = self.write()?;

        let exists = state
            .tasks
            .get(&task_id)
            .is_some_and(|task| owned(task, owner_id));
        if exists {
            state.tasks.remove(&task_id);
        }
        Ok(exists)
    }

    async fn find_tag(&self, name: &str) -> StoreResult<Option<Tag>> {
        let state = self.read()?;
        Ok(state.tags.get(name).cloned())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        self.read().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str) -> CreateUser {
        CreateUser {
            username: name.to_string(),
            email: format!("{name}@example.com"),
            password_hash: "hash".to_string(),
        }
    }

    fn tagged(title: &str, priority: i32, tags: &[&str]) -> TaskFields {
        TaskFields {
            priority,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..TaskFields::new(title)
        }
    }

    #[tokio::test]
    async fn test_insert_user_assigns_sequential_ids() {
        let store = MemoryStore::new();

        let alice = store.insert_user(new_user("alice")).await.unwrap();
        let bob = store.insert_user(new_user("bob")).await.unwrap();

        assert_eq!(alice.id, 1);
        assert_eq!(bob.id, 2);
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let store = MemoryStore::new();
        let first = store.insert_user(new_user("alice")).await.unwrap();

        let mut again = new_user("alice");
        again.email = "other@example.com".to_string();
        let err = store.insert_user(again).await.unwrap_err();
        assert_eq!(err, StoreError::DuplicateUsername("alice".to_string()));

        let stored = store.find_user_by_username("alice").await.unwrap().unwrap();
        assert_eq!(stored, first);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryStore::new();
        store.insert_user(new_user("alice")).await.unwrap();

        let mut other = new_user("bob");
        other.email = "alice@example.com".to_string();
        let err = store.insert_user(other).await.unwrap_err();

        assert!(err.is_duplicate());
        assert!(store.find_user_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_task_defaults_and_sorted_tags() {
        let store = MemoryStore::new();

        let task = store
            .create_task(1, tagged("Read", 2, &["zeta", "alpha", "zeta"]))
            .await
            .unwrap();

        assert_eq!(task.owner_id, 1);
        assert!(!task.is_completed);
        assert_eq!(task.tags, vec!["alpha", "zeta"]);
    }

    #[tokio::test]
    async fn test_foreign_task_is_not_found() {
        let store = MemoryStore::new();
        let task = store.create_task(1, TaskFields::new("mine")).await.unwrap();

        assert!(store.get_task(task.id, 2).await.unwrap().is_none());
        assert!(store
            .update_task(task.id, 2, TaskFields::new("stolen"))
            .await
            .unwrap()
            .is_none());
        assert!(!store.delete_task(task.id, 2).await.unwrap());

        let still = store.get_task(task.id, 1).await.unwrap().unwrap();
        assert_eq!(still.title, "mine");
    }

    #[tokio::test]
    async fn test_update_replaces_tags_and_keeps_old_tag() {
        let store = MemoryStore::new();
        let task = store
            .create_task(1, tagged("t", 2, &["x", "y"]))
            .await
            .unwrap();

        let updated = store
            .update_task(task.id, 1, tagged("t2", 1, &["y", "z"]))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.title, "t2");
        assert_eq!(updated.priority, 1);
        assert_eq!(updated.tags, vec!["y", "z"]);
        assert!(store.find_tag("x").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_tags_are_shared_across_users() {
        let store = MemoryStore::new();
        store.create_task(1, tagged("a", 2, &["shared"])).await.unwrap();
        let first = store.find_tag("shared").await.unwrap().unwrap();

        store.create_task(2, tagged("b", 2, &["shared"])).await.unwrap();
        let second = store.find_tag("shared").await.unwrap().unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_list_pagination_and_scope() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store
                .create_task(1, TaskFields::new(format!("a{i}")))
                .await
                .unwrap();
            store
                .create_task(2, TaskFields::new(format!("b{i}")))
                .await
                .unwrap();
        }

        let page = store.list_tasks(1, 1, 2).await.unwrap();
        let titles: Vec<_> = page.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["a1", "a2"]);

        assert_eq!(store.list_all_tasks(2).await.unwrap().len(), 5);
        assert!(store.list_tasks(1, 10, 100).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_task_has_no_effect() {
        let store = MemoryStore::new();
        store.create_task(1, TaskFields::new("keep")).await.unwrap();

        assert!(!store.delete_task(99, 1).await.unwrap());
        assert_eq!(store.list_all_tasks(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_keeps_tags() {
        let store = MemoryStore::new();
        let task = store
            .create_task(1, tagged("t", 2, &["kept"]))
            .await
            .unwrap();

        assert!(store.delete_task(task.id, 1).await.unwrap());
        assert!(store.get_task(task.id, 1).await.unwrap().is_none());
        assert!(store.find_tag("kept").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_ping() {
        assert!(MemoryStore::new().ping().await.is_ok());
    }
}
