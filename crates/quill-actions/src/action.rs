//! The canonical action set.
//!
//! Both surface grammars (tagged blocks and structured tool calls) parse
//! into the same [`Action`] enum, so downstream execution never needs to
//! know which grammar produced a given action.

use serde::{Deserialize, Serialize};

/// Status of a tracked task, as reported by the model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Task is open.
    Pending,
    /// Task is done.
    Completed,
}

impl TaskStatus {
    /// Parses a status keyword, tolerating surrounding whitespace and case.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "completed" | "complete" | "done" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// One parsed action, in document order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Action {
    /// Replace `old_text` with `new_text` in an existing file.
    #[serde(rename_all = "camelCase")]
    Edit {
        /// Target file path as written by the model (pre-resolution).
        path: String,
        /// Exact text to find.
        old_text: String,
        /// Replacement text.
        new_text: String,
    },
    /// Create a new file with the given content.
    #[serde(rename_all = "camelCase")]
    Create {
        /// Target file path.
        path: String,
        /// Full file content.
        content: String,
    },
    /// Delete an existing file.
    #[serde(rename_all = "camelCase")]
    Delete {
        /// Target file path.
        path: String,
        /// Model-supplied rationale (may be empty).
        reason: String,
    },
    /// Add or update a tracked task.
    #[serde(rename_all = "camelCase")]
    TaskUpdate {
        /// Task description; doubles as its identity.
        description: String,
        /// New status.
        status: TaskStatus,
    },
    /// Request a codebase search over the symbol index.
    #[serde(rename_all = "camelCase")]
    SearchRequest {
        /// Keywords, aggregated across the whole response.
        keywords: Vec<String>,
    },
    /// Request a 1-indexed inclusive line range from a file.
    #[serde(rename_all = "camelCase")]
    ReadRangeRequest {
        /// Target file path.
        path: String,
        /// First line, 1-indexed.
        start_line: usize,
        /// Last line, inclusive.
        end_line: usize,
    },
    /// Request a web search.
    #[serde(rename_all = "camelCase")]
    WebSearchRequest {
        /// Search query.
        query: String,
    },
    /// Request a URL fetch.
    #[serde(rename_all = "camelCase")]
    WebFetchRequest {
        /// URL to fetch.
        url: String,
    },
}

impl Action {
    /// True for actions that mutate project state (file edits and task
    /// updates), as opposed to retrieval requests.
    #[must_use]
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::Edit { .. } | Self::Create { .. } | Self::Delete { .. } | Self::TaskUpdate { .. }
        )
    }
}

/// Result of parsing one model response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Actions in document order.
    pub actions: Vec<Action>,
    /// Response text with recognized action blocks removed.
    pub remainder: String,
}

impl Extraction {
    /// True iff the response contained at least one mutation action.
    #[must_use]
    pub fn has_actions(&self) -> bool {
        self.actions.iter().any(Action::is_mutation)
    }
}
