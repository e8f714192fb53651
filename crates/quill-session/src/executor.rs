//! Fail-fast batch action execution.
//!
//! Mutation actions are applied sequentially, in document order. The
//! first failure aborts the remaining batch; actions already applied
//! stay applied, there is no rollback. Retrieval requests are not
//! executed here, they feed the follow-up round instead.

use std::fs;

use tracing::{debug, warn};

use quill_actions::Action;
use quill_core::errors::QuillError;
use quill_index::CodebaseIndex;

use crate::errors::SessionError;
use crate::resolve::resolve_path;
use crate::tasks::TaskList;

/// Result of one batch execution.
#[derive(Debug)]
pub struct BatchOutcome {
    /// Mutations applied before the batch stopped.
    pub applied: usize,
    /// Total mutations in the batch.
    pub attempted: usize,
    /// The failure that aborted the batch, if any.
    pub error: Option<SessionError>,
}

impl BatchOutcome {
    /// Whether every mutation in the batch was applied.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Applies mutation actions to the project tree, the index and the task
/// list.
#[derive(Debug)]
pub struct ActionExecutor<'a> {
    index: &'a mut CodebaseIndex,
    tasks: &'a mut TaskList,
}

impl<'a> ActionExecutor<'a> {
    /// Create an executor over the session's index and task list.
    pub fn new(index: &'a mut CodebaseIndex, tasks: &'a mut TaskList) -> Self {
        Self { index, tasks }
    }

    /// Apply every mutation in `actions`, stopping at the first failure.
    pub fn apply(&mut self, actions: &[Action]) -> BatchOutcome {
        let attempted = actions.iter().filter(|a| a.is_mutation()).count();
        let mut applied = 0usize;

        for action in actions {
            if !action.is_mutation() {
                continue;
            }
            if let Err(err) = self.apply_one(action) {
                warn!(applied, attempted, error = %err, "action batch aborted");
                return BatchOutcome {
                    applied,
                    attempted,
                    error: Some(err),
                };
            }
            applied += 1;
        }

        BatchOutcome {
            applied,
            attempted,
            error: None,
        }
    }

    fn apply_one(&mut self, action: &Action) -> Result<(), SessionError> {
        match action {
            Action::Edit {
                path,
                old_text,
                new_text,
            } => {
                let resolved = resolve_path(self.index, path)?;
                let abs = self.index.abs_path(&resolved);
                let content =
                    fs::read_to_string(&abs).map_err(|e| QuillError::io(&resolved, e))?;
                if !content.contains(old_text.as_str()) {
                    return Err(SessionError::EditMismatch { path: resolved });
                }
                let updated = content.replacen(old_text.as_str(), new_text, 1);
                fs::write(&abs, updated).map_err(|e| QuillError::io(&resolved, e))?;
                self.index.update_file(&resolved)?;
                debug!(path = %resolved, "applied edit");
            }
            Action::Create { path, content } => {
                // Creates target new files, so the raw path is used as
                // written rather than resolved against the index.
                if self.index.get(path).is_some() {
                    return Err(SessionError::AlreadyExists { path: path.clone() });
                }
                let abs = self.index.abs_path(path);
                if abs.exists() {
                    return Err(SessionError::AlreadyExists { path: path.clone() });
                }
                if let Some(parent) = abs.parent() {
                    fs::create_dir_all(parent).map_err(|e| QuillError::io(path, e))?;
                }
                fs::write(&abs, content).map_err(|e| QuillError::io(path, e))?;
                self.index.update_file(path)?;
                debug!(path = %path, "created file");
            }
            Action::Delete { path, reason } => {
                let resolved = resolve_path(self.index, path)?;
                let abs = self.index.abs_path(&resolved);
                fs::remove_file(&abs).map_err(|e| QuillError::io(&resolved, e))?;
                self.index.remove_file(&resolved);
                debug!(path = %resolved, %reason, "deleted file");
            }
            Action::TaskUpdate {
                description,
                status,
            } => {
                self.tasks.apply(description, *status);
            }
            _ => {}
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
