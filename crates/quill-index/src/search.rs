//! Keyword search over the index and content search over files.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use quill_core::constants::BLOCK_SCAN_LINE_CAP;

use crate::entry::SearchMatch;
use crate::scanner::CodebaseIndex;

/// Score weight for a filename substring match.
const FILENAME_WEIGHT: u32 = 10;
/// Score weight per matching function or class name.
const SYMBOL_WEIGHT: u32 = 5;
/// Score weight per matching import target.
const IMPORT_WEIGHT: u32 = 2;

// ─────────────────────────────────────────────────────────────────────────────
// Result types
// ─────────────────────────────────────────────────────────────────────────────

/// A scored file from [`CodebaseIndex::search_files`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredFile {
    /// Project-relative path.
    pub path: String,
    /// Weighted score (0 for recency-fallback results).
    pub score: u32,
}

/// Snippet extraction mode for content search.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentMode {
    /// ± N lines around the hit.
    Simple,
    /// ± a wider window, for edit-quality context.
    Extended,
    /// Structural function/block-boundary extraction.
    Function,
}

/// All content-search matches within one file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileContentMatches {
    /// Project-relative path.
    pub path: String,
    /// Matches in document order.
    pub matches: Vec<SearchMatch>,
    /// Total match count (the sort key).
    pub total_matches: usize,
}

// ─────────────────────────────────────────────────────────────────────────────
// File search
// ─────────────────────────────────────────────────────────────────────────────

impl CodebaseIndex {
    /// Score every indexed file against `query` and return the top `limit`.
    ///
    /// Scoring: filename substring +10, each matching function/class name
    /// +5, each matching import target +2. When nothing scores above zero
    /// the fallback guarantees a non-empty result for a non-empty index:
    /// the whole index when it fits in `limit`, otherwise the `limit` most
    /// recently modified files.
    #[must_use]
    pub fn search_files(&self, query: &str, limit: usize) -> Vec<ScoredFile> {
        let needle = query.to_lowercase();

        let mut scored: Vec<(u32, &crate::entry::IndexEntry)> = self
            .entries()
            .map(|entry| {
                let mut score = 0u32;
                let file_name = entry
                    .path
                    .rsplit(['/', '\\'])
                    .next()
                    .unwrap_or(&entry.path)
                    .to_lowercase();
                if file_name.contains(&needle) {
                    score += FILENAME_WEIGHT;
                }
                for name in entry.functions.iter().chain(&entry.classes) {
                    if name.to_lowercase().contains(&needle) {
                        score += SYMBOL_WEIGHT;
                    }
                }
                for target in &entry.imports {
                    if target.to_lowercase().contains(&needle) {
                        score += IMPORT_WEIGHT;
                    }
                }
                (score, entry)
            })
            .collect();

        if scored.iter().all(|(score, _)| *score == 0) {
            // Nothing matched: hand the assembler something anyway.
            if self.len() <= limit {
                return scored
                    .into_iter()
                    .map(|(_, e)| ScoredFile { path: e.path.clone(), score: 0 })
                    .collect();
            }
            scored.sort_by(|a, b| b.1.modified_ms.cmp(&a.1.modified_ms));
            return scored
                .into_iter()
                .take(limit)
                .map(|(_, e)| ScoredFile { path: e.path.clone(), score: 0 })
                .collect();
        }

        scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.path.cmp(&b.1.path)));
        scored
            .into_iter()
            .filter(|(score, _)| *score > 0)
            .take(limit)
            .map(|(score, e)| ScoredFile { path: e.path.clone(), score })
            .collect()
    }

    /// Scan every indexed file for `keywords`, case-insensitively.
    ///
    /// Each hit yields a snippet per `mode`; `context_lines` is the half
    /// window for the line-window modes (callers pass their configured
    /// simple or extended width). A file appears at most once
    /// (its matches for all keywords aggregated); results are sorted by
    /// total match count descending.
    #[must_use]
    pub fn search_file_contents(
        &self,
        keywords: &[String],
        context_lines: usize,
        mode: ContentMode,
    ) -> Vec<FileContentMatches> {
        let needles: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
        let mut results = Vec::new();

        for entry in self.entries().filter(|e| !e.skipped) {
            let Ok(bytes) = std::fs::read(self.abs_path(&entry.path)) else {
                debug!(path = %entry.path, "unreadable during content search");
                continue;
            };
            let content = String::from_utf8_lossy(&bytes);
            let lines: Vec<&str> = content.lines().collect();

            let mut matches = Vec::new();
            for (keyword, needle) in keywords.iter().zip(&needles) {
                for (idx, line) in lines.iter().enumerate() {
                    if line.to_lowercase().contains(needle) {
                        matches.push(snippet_for(keyword, &lines, idx, context_lines, mode));
                    }
                }
            }

            if !matches.is_empty() {
                let total = matches.len();
                results.push(FileContentMatches {
                    path: entry.path.clone(),
                    matches,
                    total_matches: total,
                });
            }
        }

        results.sort_by(|a, b| {
            b.total_matches
                .cmp(&a.total_matches)
                .then_with(|| a.path.cmp(&b.path))
        });
        results
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Snippet extraction
// ─────────────────────────────────────────────────────────────────────────────

fn snippet_for(
    keyword: &str,
    lines: &[&str],
    hit: usize,
    context_lines: usize,
    mode: ContentMode,
) -> SearchMatch {
    let (start, end) = match mode {
        ContentMode::Simple | ContentMode::Extended => window(lines.len(), hit, context_lines),
        ContentMode::Function => function_block(lines, hit, BLOCK_SCAN_LINE_CAP),
    };
    SearchMatch {
        keyword: keyword.to_string(),
        line: hit + 1,
        snippet: lines[start..=end].join("\n"),
        snippet_start: start + 1,
        snippet_end: end + 1,
    }
}

fn window(len: usize, hit: usize, half: usize) -> (usize, usize) {
    let start = hit.saturating_sub(half);
    let end = (hit + half).min(len.saturating_sub(1));
    (start, end)
}

static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:export\s+|default\s+|public\s+|private\s+|protected\s+|static\s+|async\s+|pub(?:\([^)]*\))?\s+)*(?:function\b|class\b|def\b|fn\b|func\b|interface\b|trait\b|impl\b)",
    )
    .expect("valid regex")
});
static BARE_SIGNATURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z_$][\w$]*)\s*\([^)]*\)\s*\{\s*$").expect("valid regex")
});

/// Control keywords that look like `name(args) {` but open a nested block,
/// not a function.
const CONTROL_KEYWORDS: &[&str] = &["if", "for", "while", "switch", "catch", "match", "return"];

fn is_block_start_line(line: &str) -> bool {
    if DECLARATION.is_match(line) {
        return true;
    }
    if let Some(caps) = BARE_SIGNATURE.captures(line) {
        return !CONTROL_KEYWORDS.contains(&&caps[1]);
    }
    false
}

/// Locate the enclosing function/block around `hit` (0-indexed inclusive).
///
/// Backward scan up to `cap` lines, tracking a running brace balance over
/// each line's characters right-to-left; the block start is the first line
/// where the balance goes negative (an unmatched opening brace) or that
/// looks like a declaration. Falls back to a symmetric ± cap/2 window when
/// no start is found. Forward from the start, the block ends at the first
/// line after the hit where the forward balance returns to zero on a line
/// containing a closing brace, or at the cap.
fn function_block(lines: &[&str], hit: usize, cap: usize) -> (usize, usize) {
    let mut balance: i64 = 0;
    let mut start = None;
    let scan_floor = hit.saturating_sub(cap);

    let mut i = hit;
    loop {
        for ch in lines[i].chars().rev() {
            match ch {
                '}' => balance += 1,
                '{' => balance -= 1,
                _ => {}
            }
        }
        if balance < 0 || is_block_start_line(lines[i]) {
            start = Some(i);
            break;
        }
        if i == scan_floor {
            break;
        }
        i -= 1;
    }

    let Some(start) = start else {
        return window(lines.len(), hit, cap / 2);
    };

    let mut forward: i64 = 0;
    let scan_ceiling = (start + cap).min(lines.len().saturating_sub(1));
    let mut end = scan_ceiling;
    for (j, line) in lines.iter().enumerate().take(scan_ceiling + 1).skip(start) {
        for ch in line.chars() {
            match ch {
                '{' => forward += 1,
                '}' => forward -= 1,
                _ => {}
            }
        }
        if j > hit && forward == 0 && line.contains('}') {
            end = j;
            break;
        }
    }

    (start, end)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
