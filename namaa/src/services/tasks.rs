//! Tasks service
//!
//! Per-user to-do list. Ids are generated here; update and delete address
//! tasks by id and report whether anything matched.

use crate::database::{NewTask, Task, TaskUpdate};
use crate::error::{AppError, Result};
use crate::storage::{new_record_id, Collection, RecordStore, StorageKey};
use chrono::{Datelike, Duration, NaiveDate, Utc};

/// Subset of tasks shown in a list view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskFilter {
    #[default]
    All,
    /// Due on the given day
    Today,
    /// Due within the Sunday-to-Saturday week containing the given day
    ThisWeek,
}

impl TaskFilter {
    pub fn matches(self, task: &Task, today: NaiveDate) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Today => task.due_date == Some(today),
            TaskFilter::ThisWeek => {
                let start =
                    today - Duration::days(today.weekday().num_days_from_sunday() as i64);
                let end = start + Duration::days(6);
                matches!(task.due_date, Some(d) if d >= start && d <= end)
            }
        }
    }
}

#[derive(Clone)]
pub struct TasksService {
    store: RecordStore,
}

impl TasksService {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    fn key(user_id: &str) -> Result<StorageKey> {
        StorageKey::for_user(Collection::Tasks, user_id)
    }

    /// All tasks of the user in insertion order
    pub async fn list(&self, user_id: &str) -> Result<Vec<Task>> {
        self.store.load_list(&Self::key(user_id)?).await
    }

    pub async fn list_filtered(
        &self,
        user_id: &str,
        filter: TaskFilter,
        today: NaiveDate,
    ) -> Result<Vec<Task>> {
        let tasks = self.list(user_id).await?;
        Ok(tasks
            .into_iter()
            .filter(|t| filter.matches(t, today))
            .collect())
    }

    pub async fn add(&self, user_id: &str, new_task: NewTask) -> Result<Task> {
        if new_task.title.trim().is_empty() {
            return Err(AppError::Validation("task title must not be empty".to_string()));
        }

        let task = Task {
            id: new_record_id(),
            user_id: user_id.to_string(),
            title: new_task.title,
            completed: new_task.completed,
            priority: new_task.priority,
            due_date: new_task.due_date,
            created_at: Utc::now(),
        };

        let stored = task.clone();
        self.store
            .modify_list(&Self::key(user_id)?, move |tasks: &mut Vec<Task>| {
                tasks.push(stored);
                Ok(())
            })
            .await?;

        tracing::info!("Added task {} for user {}", task.id, user_id);
        Ok(task)
    }

    /// Returns false when no task has the given id
    pub async fn update(&self, user_id: &str, id: &str, update: TaskUpdate) -> Result<bool> {
        let found = self
            .store
            .modify_list(&Self::key(user_id)?, |tasks: &mut Vec<Task>| {
                Ok(match tasks.iter_mut().find(|t| t.id == id) {
                    Some(task) => {
                        update.apply(task);
                        true
                    }
                    None => false,
                })
            })
            .await?;

        if found {
            tracing::debug!("Updated task {}", id);
        } else {
            tracing::debug!("Task {} not found for update", id);
        }
        Ok(found)
    }

    pub async fn toggle(&self, user_id: &str, id: &str) -> Result<bool> {
        self.store
            .modify_list(&Self::key(user_id)?, |tasks: &mut Vec<Task>| {
                Ok(match tasks.iter_mut().find(|t| t.id == id) {
                    Some(task) => {
                        task.completed = !task.completed;
                        true
                    }
                    None => false,
                })
            })
            .await
    }

    /// Returns false when no task has the given id
    pub async fn delete(&self, user_id: &str, id: &str) -> Result<bool> {
        let removed = self
            .store
            .modify_list(&Self::key(user_id)?, |tasks: &mut Vec<Task>| {
                let before = tasks.len();
                tasks.retain(|t| t.id != id);
                Ok(tasks.len() != before)
            })
            .await?;

        if removed {
            tracing::info!("Deleted task {}", id);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Priority;
    use crate::services::test_store;

    fn new_task(title: &str) -> NewTask {
        NewTask {
            title: title.to_string(),
            ..NewTask::default()
        }
    }

    #[tokio::test]
    async fn test_add_and_list() {
        let service = TasksService::new(test_store().await);

        let task = service.add("u1", new_task("Read")).await.unwrap();
        assert_eq!(task.user_id, "u1");
        assert_eq!(task.priority, Priority::Medium);
        assert!(!task.completed);

        let tasks = service.list("u1").await.unwrap();
        assert_eq!(tasks, vec![task]);
    }

    #[tokio::test]
    async fn test_blank_title_rejected() {
        let service = TasksService::new(test_store().await);

        let err = service.add("u1", new_task("  ")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(service.list("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let service = TasksService::new(test_store().await);

        service.add("u1", new_task("mine")).await.unwrap();
        assert!(service.list("u2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let service = TasksService::new(test_store().await);

        let a = service.add("u1", new_task("a")).await.unwrap();
        let b = service.add("u1", new_task("b")).await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let service = TasksService::new(test_store().await);
        let task = service.add("u1", new_task("Read")).await.unwrap();

        let found = service
            .update("u1", &task.id, TaskUpdate::completed(true))
            .await
            .unwrap();
        assert!(found);

        let stored = &service.list("u1").await.unwrap()[0];
        assert!(stored.completed);
        assert_eq!(stored.title, "Read");
        assert_eq!(stored.id, task.id);
        assert_eq!(stored.created_at, task.created_at);
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_noop() {
        let service = TasksService::new(test_store().await);
        service.add("u1", new_task("Read")).await.unwrap();
        let before = service.list("u1").await.unwrap();

        let found = service
            .update("u1", "nope", TaskUpdate::completed(true))
            .await
            .unwrap();

        assert!(!found);
        assert_eq!(service.list("u1").await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_delete() {
        let service = TasksService::new(test_store().await);
        let a = service.add("u1", new_task("a")).await.unwrap();
        let b = service.add("u1", new_task("b")).await.unwrap();

        assert!(service.delete("u1", &a.id).await.unwrap());
        assert!(!service.delete("u1", &a.id).await.unwrap());

        assert_eq!(service.list("u1").await.unwrap(), vec![b]);
    }

    #[tokio::test]
    async fn test_toggle() {
        let service = TasksService::new(test_store().await);
        let task = service.add("u1", new_task("a")).await.unwrap();

        assert!(service.toggle("u1", &task.id).await.unwrap());
        assert!(service.list("u1").await.unwrap()[0].completed);
        assert!(service.toggle("u1", &task.id).await.unwrap());
        assert!(!service.list("u1").await.unwrap()[0].completed);
    }

    #[test]
    fn test_filters() {
        // 2024-01-03 is a Wednesday; its week runs Sunday 12-31 to Saturday 01-06
        let today = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let mut task = Task {
            id: "t".to_string(),
            user_id: "u".to_string(),
            title: "x".to_string(),
            completed: false,
            priority: Priority::Low,
            due_date: None,
            created_at: Utc::now(),
        };

        assert!(TaskFilter::All.matches(&task, today));
        assert!(!TaskFilter::Today.matches(&task, today));
        assert!(!TaskFilter::ThisWeek.matches(&task, today));

        task.due_date = Some(today);
        assert!(TaskFilter::Today.matches(&task, today));

        task.due_date = NaiveDate::from_ymd_opt(2023, 12, 31);
        assert!(TaskFilter::ThisWeek.matches(&task, today));
        assert!(!TaskFilter::Today.matches(&task, today));

        task.due_date = NaiveDate::from_ymd_opt(2024, 1, 7);
        assert!(!TaskFilter::ThisWeek.matches(&task, today));
    }
}
