//! Fuzzy path resolution against the index.

use tracing::debug;

use quill_actions::normalize_path;
use quill_index::CodebaseIndex;

use crate::errors::SessionError;

/// Resolve a model-written path to an indexed project-relative path.
///
/// Tries, in order: the exact index key, a path-suffix match, then a
/// bare-filename match. Zero matches or multiple ambiguous matches fail
/// with a descriptive error that aborts only the one action referencing
/// the path.
pub fn resolve_path(index: &CodebaseIndex, raw: &str) -> Result<String, SessionError> {
    let cleaned = normalize_path(raw);
    if index.get(&cleaned).is_some() {
        return Ok(cleaned);
    }

    let suffix = format!("/{cleaned}");
    let mut candidates: Vec<String> = index
        .entries()
        .filter(|e| e.path.ends_with(&suffix))
        .map(|e| e.path.clone())
        .collect();

    if candidates.is_empty() {
        let file_name = cleaned.rsplit('/').next().unwrap_or(&cleaned);
        let name_suffix = format!("/{file_name}");
        candidates = index
            .entries()
            .filter(|e| e.path == file_name || e.path.ends_with(&name_suffix))
            .map(|e| e.path.clone())
            .collect();
    }

    match candidates.len() {
        0 => Err(SessionError::PathNotFound { path: cleaned }),
        1 => {
            let resolved = candidates.remove(0);
            debug!(raw = %cleaned, %resolved, "fuzzy-resolved path");
            Ok(resolved)
        }
        _ => {
            candidates.sort();
            Err(SessionError::PathAmbiguous {
                path: cleaned,
                candidates,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use tempfile::TempDir;

    use quill_core::config::SessionConfig;

    use super::*;

    fn index_with(paths: &[&str]) -> (TempDir, CodebaseIndex) {
        let dir = TempDir::new().unwrap();
        for rel in paths {
            let abs = dir.path().join(rel);
            std::fs::create_dir_all(abs.parent().unwrap()).unwrap();
            std::fs::write(abs, "fn x() {}\n").unwrap();
        }
        let mut index = CodebaseIndex::new(dir.path(), &SessionConfig::default());
        let _ = index.build_index().unwrap();
        (dir, index)
    }

    #[test]
    fn exact_key_wins() {
        let (_dir, index) = index_with(&["src/util.rs", "util.rs"]);
        assert_eq!(resolve_path(&index, "src/util.rs").unwrap(), "src/util.rs");
    }

    #[test]
    fn filename_resolves_to_unique_match() {
        let (_dir, index) = index_with(&["src/deep/helper.rs", "src/main.rs"]);
        assert_eq!(
            resolve_path(&index, "helper.rs").unwrap(),
            "src/deep/helper.rs"
        );
    }

    #[test]
    fn partial_path_suffix_beats_filename() {
        let (_dir, index) = index_with(&["src/a/util.rs", "src/b/util.rs"]);
        assert_eq!(resolve_path(&index, "a/util.rs").unwrap(), "src/a/util.rs");
    }

    #[test]
    fn decorated_path_is_cleaned_before_lookup() {
        let (_dir, index) = index_with(&["src/main.rs"]);
        assert_eq!(resolve_path(&index, " `src/main.rs` ").unwrap(), "src/main.rs");
    }

    #[test]
    fn unknown_path_is_not_found() {
        let (_dir, index) = index_with(&["src/main.rs"]);
        assert_matches!(
            resolve_path(&index, "ghost.rs"),
            Err(SessionError::PathNotFound { .. })
        );
    }

    #[test]
    fn ambiguous_filename_fails_with_candidates() {
        let (_dir, index) = index_with(&["src/a/util.rs", "src/b/util.rs"]);
        assert_matches!(
            resolve_path(&index, "util.rs"),
            Err(SessionError::PathAmbiguous { candidates, .. }) if candidates.len() == 2
        );
    }
}
