//! The session task list.
//!
//! Tasks are keyed by their description: a task update whose description
//! matches an existing task changes its status, anything else appends a
//! new task. The list persists in the tasks document, rewritten wholesale
//! at each checkpoint.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use quill_actions::TaskStatus;

/// One tracked task.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskItem {
    /// Task description; doubles as its identity.
    pub description: String,
    /// Current status.
    pub status: TaskStatus,
    /// RFC3339 timestamp of the last status change.
    pub updated_at: String,
}

/// Persisted tasks document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TasksDocument {
    /// All tracked tasks.
    #[serde(default)]
    pub tasks: Vec<TaskItem>,
    /// When the document was last saved (RFC3339).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

/// In-memory task list.
#[derive(Clone, Debug, Default)]
pub struct TaskList {
    tasks: Vec<TaskItem>,
}

impl TaskList {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All tasks in insertion order.
    #[must_use]
    pub fn tasks(&self) -> &[TaskItem] {
        &self.tasks
    }

    /// Number of tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Apply a task update: matching description updates the status,
    /// otherwise a new task is appended.
    pub fn apply(&mut self, description: &str, status: TaskStatus) {
        let now = Utc::now().to_rfc3339();
        if let Some(task) = self.tasks.iter_mut().find(|t| t.description == description) {
            task.status = status;
            task.updated_at = now;
        } else {
            self.tasks.push(TaskItem {
                description: description.to_string(),
                status,
                updated_at: now,
            });
        }
    }

    /// One-line-per-task summary of pending tasks for prompt inclusion.
    /// Empty string when nothing is pending.
    #[must_use]
    pub fn pending_summary(&self) -> String {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Pending)
            .map(|t| format!("- {}", t.description))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Snapshot for checkpoint persistence.
    #[must_use]
    pub fn to_document(&self) -> TasksDocument {
        TasksDocument {
            tasks: self.tasks.clone(),
            last_updated: Some(Utc::now().to_rfc3339()),
        }
    }

    /// Restore from a persisted document.
    pub fn load_document(&mut self, doc: TasksDocument) {
        self.tasks = doc.tasks;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_appends_then_updates() {
        let mut list = TaskList::new();
        list.apply("wire logging", TaskStatus::Pending);
        list.apply("add tests", TaskStatus::Pending);
        assert_eq!(list.len(), 2);

        list.apply("wire logging", TaskStatus::Completed);
        assert_eq!(list.len(), 2);
        assert_eq!(list.tasks()[0].status, TaskStatus::Completed);
    }

    #[test]
    fn pending_summary_lists_only_pending() {
        let mut list = TaskList::new();
        list.apply("done thing", TaskStatus::Completed);
        list.apply("open thing", TaskStatus::Pending);
        assert_eq!(list.pending_summary(), "- open thing");
    }

    #[test]
    fn empty_summary_for_no_pending() {
        let mut list = TaskList::new();
        list.apply("done thing", TaskStatus::Completed);
        assert_eq!(list.pending_summary(), "");
    }

    #[test]
    fn document_round_trip() {
        let mut list = TaskList::new();
        list.apply("persist me", TaskStatus::Pending);
        let doc = list.to_document();
        assert!(doc.last_updated.is_some());

        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("lastUpdated"));
        let back: TasksDocument = serde_json::from_str(&json).unwrap();

        let mut restored = TaskList::new();
        restored.load_document(back);
        assert_eq!(restored.tasks(), list.tasks());
    }
}
