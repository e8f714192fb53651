//! Index entry and persisted index document types.

use serde::{Deserialize, Serialize};

/// Per-file symbol table entry.
///
/// Owned exclusively by the index: rebuilt wholesale on a full scan or
/// replaced per-path on an incremental update.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    /// Project-relative path (unique key).
    pub path: String,
    /// File size in bytes.
    pub size: u64,
    /// Modification time (epoch milliseconds).
    pub modified_ms: u64,
    /// File-type tag (lowercase extension, or empty).
    pub file_type: String,
    /// Extracted function names.
    pub functions: Vec<String>,
    /// Extracted class names.
    pub classes: Vec<String>,
    /// Extracted import targets.
    pub imports: Vec<String>,
    /// Extracted export names.
    pub exports: Vec<String>,
    /// Whether the file exceeded the size ceiling and was not parsed.
    #[serde(default)]
    pub skipped: bool,
}

impl IndexEntry {
    /// Entry for a file above the size ceiling: recorded, not parsed.
    #[must_use]
    pub fn skipped(path: impl Into<String>, size: u64, modified_ms: u64, file_type: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            size,
            modified_ms,
            file_type: file_type.into(),
            functions: Vec::new(),
            classes: Vec::new(),
            imports: Vec::new(),
            exports: Vec::new(),
            skipped: true,
        }
    }
}

/// A single content-search hit. Transient: produced per query, never
/// persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMatch {
    /// Keyword that matched.
    pub keyword: String,
    /// 1-indexed line number of the hit.
    pub line: usize,
    /// Extracted snippet text.
    pub snippet: String,
    /// 1-indexed first line of the snippet.
    pub snippet_start: usize,
    /// 1-indexed last line of the snippet.
    pub snippet_end: usize,
}

/// Persisted index document, rewritten wholesale at each checkpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDocument {
    /// Project root the index was built against.
    pub project_root: String,
    /// When the last full scan completed (RFC3339), if ever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_indexed: Option<String>,
    /// All entries.
    #[serde(default)]
    pub files: Vec<IndexEntry>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
