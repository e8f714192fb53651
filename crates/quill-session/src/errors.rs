//! Session-level error type.

use thiserror::Error;

use quill_core::errors::{ModelError, QuillError};

/// Errors surfaced by session operations.
///
/// Path-resolution failures carry enough context to report which single
/// action was aborted; they never take down the session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Model collaborator failure after retries were exhausted.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Core error (I/O, line range, internal).
    #[error(transparent)]
    Core(#[from] QuillError),

    /// A referenced path matched nothing in the index, even by filename.
    #[error("no indexed file matches '{path}'")]
    PathNotFound {
        /// The cleaned path as written by the model.
        path: String,
    },

    /// A referenced path matched more than one indexed file by filename.
    #[error("'{path}' is ambiguous: matches {candidates:?}")]
    PathAmbiguous {
        /// The cleaned path as written by the model.
        path: String,
        /// All matching index paths.
        candidates: Vec<String>,
    },

    /// An edit's old text was not found in the target file.
    #[error("edit target text not found in {path}")]
    EditMismatch {
        /// Resolved file path.
        path: String,
    },

    /// A create action targets a path that already exists.
    #[error("file already exists: {path}")]
    AlreadyExists {
        /// Target path.
        path: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_path() {
        let err = SessionError::PathNotFound {
            path: "ghost.rs".into(),
        };
        assert!(err.to_string().contains("ghost.rs"));

        let err = SessionError::PathAmbiguous {
            path: "util.rs".into(),
            candidates: vec!["a/util.rs".into(), "b/util.rs".into()],
        };
        assert!(err.to_string().contains("a/util.rs"));
    }
}
