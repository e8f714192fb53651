//! Index construction and maintenance.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use tracing::{debug, info};
use walkdir::WalkDir;

use quill_core::QuillError;
use quill_core::config::SessionConfig;

use crate::analyzers::extract_symbols;
use crate::entry::{IndexDocument, IndexEntry};

/// The codebase symbol index.
///
/// Owns one [`IndexEntry`] per surviving file under the project root.
/// Rebuilt wholesale by [`build_index`](Self::build_index) or patched
/// per-path by [`update_file`](Self::update_file).
#[derive(Debug)]
pub struct CodebaseIndex {
    project_root: PathBuf,
    skip_dirs: Vec<String>,
    skip_extensions: Vec<String>,
    max_file_size: u64,
    entries: BTreeMap<String, IndexEntry>,
    last_indexed: Option<String>,
}

fn modified_ms(metadata: &std::fs::Metadata) -> u64 {
    metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

fn file_type_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

impl CodebaseIndex {
    /// Create an empty index for a project root.
    #[must_use]
    pub fn new(project_root: impl Into<PathBuf>, config: &SessionConfig) -> Self {
        Self {
            project_root: project_root.into(),
            skip_dirs: config.skip_dirs.clone(),
            skip_extensions: config.skip_extensions.clone(),
            max_file_size: config.max_file_size_bytes,
            entries: BTreeMap::new(),
            last_indexed: None,
        }
    }

    /// Project root this index was built against.
    #[must_use]
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Absolute path for a project-relative path.
    #[must_use]
    pub fn abs_path(&self, rel: &str) -> PathBuf {
        self.project_root.join(rel)
    }

    /// Number of indexed files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by project-relative path.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&IndexEntry> {
        self.entries.get(path)
    }

    /// Iterate all entries.
    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    /// When the last full scan completed (RFC3339), if ever.
    #[must_use]
    pub fn last_indexed(&self) -> Option<&str> {
        self.last_indexed.as_deref()
    }

    fn is_denied_extension(&self, file_name: &str) -> bool {
        self.skip_extensions
            .iter()
            .any(|ext| file_name.ends_with(&format!(".{ext}")))
    }

    /// Rebuild the whole index by scanning the project root.
    ///
    /// Returns the number of files indexed (including skipped oversized
    /// files, which are recorded without symbol extraction).
    pub fn build_index(&mut self) -> Result<usize, QuillError> {
        let mut entries = BTreeMap::new();

        let walker = WalkDir::new(&self.project_root).into_iter();
        for entry in walker.filter_entry(|e| {
            let name = e.file_name().to_string_lossy();
            if e.depth() > 0 && e.file_type().is_dir() {
                if name.starts_with('.') {
                    return false;
                }
                if self.skip_dirs.iter().any(|d| d == name.as_ref()) {
                    return false;
                }
            }
            true
        }) {
            let Ok(entry) = entry else { continue };
            if !entry.file_type().is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy();
            if file_name.starts_with('.') || self.is_denied_extension(&file_name) {
                continue;
            }

            let rel = entry
                .path()
                .strip_prefix(&self.project_root)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .into_owned();

            match self.index_one(entry.path(), &rel) {
                Ok(indexed) => {
                    let _ = entries.insert(rel, indexed);
                }
                Err(err) => debug!(path = %rel, %err, "skipping unreadable file"),
            }
        }

        self.entries = entries;
        self.last_indexed = Some(chrono::Utc::now().to_rfc3339());
        info!(files = self.entries.len(), root = %self.project_root.display(), "index rebuilt");
        Ok(self.entries.len())
    }

    /// Re-index a single file, replacing its entry.
    pub fn update_file(&mut self, rel: &str) -> Result<(), QuillError> {
        let abs = self.abs_path(rel);
        let indexed = self.index_one(&abs, rel)?;
        let _ = self.entries.insert(rel.to_string(), indexed);
        Ok(())
    }

    /// Drop a file's entry (after deletion).
    pub fn remove_file(&mut self, rel: &str) {
        let _ = self.entries.remove(rel);
    }

    fn index_one(&self, abs: &Path, rel: &str) -> Result<IndexEntry, QuillError> {
        let metadata = std::fs::metadata(abs).map_err(|e| QuillError::io(rel, e))?;
        let size = metadata.len();
        let modified = modified_ms(&metadata);
        let file_type = file_type_of(abs);

        if size > self.max_file_size {
            debug!(path = %rel, size, "file above size ceiling, recording as skipped");
            return Ok(IndexEntry::skipped(rel, size, modified, file_type));
        }

        let bytes = std::fs::read(abs).map_err(|e| QuillError::io(rel, e))?;
        let content = String::from_utf8_lossy(&bytes);
        let symbols = extract_symbols(&file_type, &content);

        Ok(IndexEntry {
            path: rel.to_string(),
            size,
            modified_ms: modified,
            file_type,
            functions: symbols.functions,
            classes: symbols.classes,
            imports: symbols.imports,
            exports: symbols.exports,
            skipped: false,
        })
    }

    // ── Persistence ──

    /// Snapshot the index as a persisted document.
    #[must_use]
    pub fn to_document(&self) -> IndexDocument {
        IndexDocument {
            project_root: self.project_root.to_string_lossy().into_owned(),
            last_indexed: self.last_indexed.clone(),
            files: self.entries.values().cloned().collect(),
        }
    }

    /// Restore entries from a persisted document.
    pub fn load_document(&mut self, doc: IndexDocument) {
        self.last_indexed = doc.last_indexed;
        self.entries = doc
            .files
            .into_iter()
            .map(|entry| (entry.path.clone(), entry))
            .collect();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
