//! Line-range reads and prompt-ready file loading.

use serde::{Deserialize, Serialize};

use quill_core::errors::{QuillError, RangeError};

use crate::scanner::CodebaseIndex;
use crate::search::FileContentMatches;

/// Result of a 1-indexed inclusive line-range read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRange {
    /// Project-relative path.
    pub path: String,
    /// 1-indexed start line.
    pub start: usize,
    /// 1-indexed end line after clamping to the file.
    pub end: usize,
    /// The requested lines.
    pub content: String,
    /// Total lines in the file.
    pub total_lines: usize,
}

/// A file prepared for prompt inclusion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadedFile {
    /// Project-relative path.
    pub path: String,
    /// Complete content for small files; snippets plus read-range guidance
    /// for large ones.
    pub content: String,
    /// Whether `content` is the whole file.
    pub loaded_completely: bool,
    /// Total lines in the file.
    pub total_lines: usize,
}

impl CodebaseIndex {
    /// Read a 1-indexed inclusive line range, clamping `end` to the file.
    ///
    /// Fails with a range error when `start > end` or `start` is beyond
    /// the end of the file.
    pub fn read_line_range(&self, rel: &str, start: usize, end: usize) -> Result<LineRange, QuillError> {
        if start == 0 || start > end {
            return Err(RangeError::new(rel, start, end, "start must be >= 1 and <= end").into());
        }

        let bytes = std::fs::read(self.abs_path(rel)).map_err(|e| QuillError::io(rel, e))?;
        let content = String::from_utf8_lossy(&bytes);
        let lines: Vec<&str> = content.lines().collect();
        let total_lines = lines.len();

        if start > total_lines {
            return Err(RangeError::new(
                rel,
                start,
                end,
                format!("start is beyond end of file ({total_lines} lines)"),
            )
            .into());
        }

        let clamped_end = end.min(total_lines);
        Ok(LineRange {
            path: rel.to_string(),
            start,
            end: clamped_end,
            content: lines[start - 1..clamped_end].join("\n"),
            total_lines,
        })
    }

    /// Turn content-search results into prompt-ready file loads.
    ///
    /// Files at or below `small_file_line_threshold` lines are included
    /// whole so the model can produce complete edits; larger files get
    /// only the already-extracted snippets plus explicit guidance to
    /// request specific line ranges.
    #[must_use]
    pub fn load_files_from_search_results(
        &self,
        results: &[FileContentMatches],
        small_file_line_threshold: usize,
    ) -> Vec<LoadedFile> {
        let mut loaded = Vec::new();
        for result in results {
            let Ok(bytes) = std::fs::read(self.abs_path(&result.path)) else {
                continue;
            };
            let content = String::from_utf8_lossy(&bytes);
            let total_lines = content.lines().count();

            if total_lines <= small_file_line_threshold {
                loaded.push(LoadedFile {
                    path: result.path.clone(),
                    content: content.into_owned(),
                    loaded_completely: true,
                    total_lines,
                });
            } else {
                let mut sections = Vec::new();
                for m in &result.matches {
                    sections.push(format!(
                        "[lines {}-{}, match for \"{}\" at line {}]\n{}",
                        m.snippet_start, m.snippet_end, m.keyword, m.line, m.snippet
                    ));
                }
                sections.push(format!(
                    "[file has {total_lines} lines; shown above are matching snippets only — request specific line ranges to see more]"
                ));
                loaded.push(LoadedFile {
                    path: result.path.clone(),
                    content: sections.join("\n\n"),
                    loaded_completely: false,
                    total_lines,
                });
            }
        }
        loaded
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
