//! Per-session configuration.
//!
//! Every tunable the core components consume lives here, with serde
//! defaults so a partial (or absent) config document still loads.

use serde::{Deserialize, Serialize};

use crate::retry::RetryPolicy;

/// Configuration for one Quill session.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Model context window size in tokens.
    #[serde(default = "default_context_window")]
    pub context_window: usize,
    /// Tokens reserved for the model response when computing availability.
    #[serde(default = "default_reserved_response_tokens")]
    pub reserved_response_tokens: usize,
    /// Token ratio of the context window that makes compression due.
    #[serde(default = "default_compression_threshold")]
    pub compression_threshold: f64,
    /// Number of newest messages never compressed away.
    #[serde(default = "default_keep_recent_count")]
    pub keep_recent_count: usize,
    /// Files larger than this (bytes) are indexed as skipped, without symbols.
    #[serde(default = "default_max_file_size_bytes")]
    pub max_file_size_bytes: u64,
    /// Files at or below this many lines are included whole in prompts.
    #[serde(default = "default_small_file_line_threshold")]
    pub small_file_line_threshold: usize,
    /// Context lines around a hit in simple content-search mode.
    #[serde(default = "default_simple_context_lines")]
    pub simple_context_lines: usize,
    /// Context lines around a hit in extended content-search mode.
    #[serde(default = "default_extended_context_lines")]
    pub extended_context_lines: usize,
    /// Maximum files returned by a keyword search.
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
    /// Directory names excluded from indexing.
    #[serde(default = "default_skip_dirs")]
    pub skip_dirs: Vec<String>,
    /// File extensions excluded from indexing.
    #[serde(default = "default_skip_extensions")]
    pub skip_extensions: Vec<String>,
    /// Retry policy for model-collaborator calls.
    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_context_window() -> usize {
    128_000
}
fn default_reserved_response_tokens() -> usize {
    4_096
}
fn default_compression_threshold() -> f64 {
    0.70
}
fn default_keep_recent_count() -> usize {
    6
}
fn default_max_file_size_bytes() -> u64 {
    1_000_000
}
fn default_small_file_line_threshold() -> usize {
    300
}
fn default_simple_context_lines() -> usize {
    3
}
fn default_extended_context_lines() -> usize {
    15
}
fn default_search_limit() -> usize {
    10
}
fn default_skip_dirs() -> Vec<String> {
    ["node_modules", ".git", "target", "dist", "build", ".next", "coverage", "__pycache__", ".venv"]
        .iter()
        .map(ToString::to_string)
        .collect()
}
fn default_skip_extensions() -> Vec<String> {
    [
        "png", "jpg", "jpeg", "gif", "ico", "svg", "woff", "woff2", "ttf", "eot", "zip", "tar",
        "gz", "pdf", "lock", "min.js", "map", "wasm", "so", "dylib", "exe", "bin",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

impl Default for SessionConfig {
    fn default() -> Self {
        serde_json::from_str("{}").expect("empty config deserializes via defaults")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = SessionConfig::default();
        assert_eq!(config.context_window, 128_000);
        assert_eq!(config.reserved_response_tokens, 4_096);
        assert!((config.compression_threshold - 0.70).abs() < f64::EPSILON);
        assert_eq!(config.keep_recent_count, 6);
        assert!(config.skip_dirs.iter().any(|d| d == "node_modules"));
        assert!(config.skip_extensions.iter().any(|e| e == "png"));
    }

    #[test]
    fn partial_document_fills_defaults() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"contextWindow": 200000}"#).unwrap();
        assert_eq!(config.context_window, 200_000);
        assert_eq!(config.keep_recent_count, 6);
    }

    #[test]
    fn serde_roundtrip_camel_case() {
        let config = SessionConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("contextWindow"));
        assert!(json.contains("keepRecentCount"));
        let back: SessionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.context_window, config.context_window);
    }
}
