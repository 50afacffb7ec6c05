//! Per-user task statistics.
//!
//! [`summarize`] is a pure function over a storage-ordered task list;
//! [`summarize_for_owner`] loads that list from a [`TaskRepository`] first.
//! Nothing is cached.

use serde::{Deserialize, Serialize};

use crate::models::task::{Priority, Task};
use crate::repository::{StoreResult, TaskRepository};

/// `{id, title}` entry of a priority bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRef {
    pub id: i64,
    pub title: String,
}

/// One priority bucket
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityBucket {
    pub count: usize,
    pub tasks: Vec<TaskRef>,
}

impl PriorityBucket {
    fn push(&mut self, task: &Task) {
        self.count += 1;
        self.tasks.push(TaskRef {
            id: task.id,
            title: task.title.clone(),
        });
    }
}

/// The three fixed priority buckets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TasksByPriority {
    pub high: PriorityBucket,
    pub medium: PriorityBucket,
    pub low: PriorityBucket,
}

impl TasksByPriority {
    fn bucket_mut(&mut self, priority: Priority) -> &mut PriorityBucket {
        match priority {
            Priority::High => &mut self.high,
            Priority::Medium => &mut self.medium,
            Priority::Low => &mut self.low,
        }
    }
}

/// Completed and pending counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TasksByCompletion {
    pub completed: usize,
    pub pending: usize,
}

/// Entry of the priority-sorted task list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortedTask {
    pub id: i64,
    pub title: String,
    pub priority: i32,
    pub is_completed: bool,
}

/// Summary of one user's tasks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub pending_tasks: usize,
    /// Same value as `tasks_by_priority.high.count`
    pub high_priority_tasks: usize,
    pub tasks_by_priority: TasksByPriority,
    pub tasks_by_completion: TasksByCompletion,
    pub all_tasks_sorted: Vec<SortedTask>,
}

/// Summarizes tasks given in storage order.
///
/// Tasks are stably sorted by priority, so equal priorities keep their input
/// order. A priority outside 1..=3 lands in no bucket but still counts toward
/// the totals and appears in `all_tasks_sorted`.
pub fn summarize(tasks: &[Task]) -> TaskStats {
    let mut sorted: Vec<&Task> = tasks.iter().collect();
    sorted.sort_by_key(|task| task.priority);

    let mut stats = TaskStats {
        total_tasks: sorted.len(),
        ..TaskStats::default()
    };

    for task in &sorted {
        if task.is_completed {
            stats.completed_tasks += 1;
        }
        if let Some(priority) = Priority::from_level(task.priority) {
            stats.tasks_by_priority.bucket_mut(priority).push(task);
        }
        stats.all_tasks_sorted.push(SortedTask {
            id: task.id,
            title: task.title.clone(),
            priority: task.priority,
            is_completed: task.is_completed,
        });
    }

    stats.pending_tasks = stats.total_tasks - stats.completed_tasks;
    stats.high_priority_tasks = stats.tasks_by_priority.high.count;
    stats.tasks_by_completion = TasksByCompletion {
        completed: stats.completed_tasks,
        pending: stats.pending_tasks,
    };

    stats
}

/// Loads every task of `owner_id` and summarizes it
pub async fn summarize_for_owner<R>(tasks: &R, owner_id: i64) -> StoreResult<TaskStats>
where
    R: TaskRepository + ?Sized,
{
    let all = tasks.list_all_tasks(owner_id).await?;
    tracing::debug!(owner_id, total = all.len(), "Summarizing tasks");
    Ok(summarize(&all))
}
