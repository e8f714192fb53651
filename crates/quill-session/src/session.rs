//! The per-project session object.
//!
//! One [`Session`] owns all shared core state: the symbol index, the
//! conversation ledger, the token ledger, the task list and the
//! configuration. There are no process-wide singletons; components
//! receive this state by reference. Persistence happens only at explicit
//! checkpoints, which rewrite the three JSON documents wholesale.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use quill_actions::{Action, parse_tagged};
use quill_core::config::SessionConfig;
use quill_core::errors::QuillError;
use quill_core::messages::ConversationMessage;
use quill_history::{CompressionOutcome, ConversationLedger, HistoryDocument, Summarizer};
use quill_index::{CodebaseIndex, ContentMode, IndexDocument};
use quill_prompt::{AssemblyMetadata, PromptAssembler, PromptInputs};
use quill_tokens::{TokenLedger, UsageReading};

use crate::errors::SessionError;
use crate::executor::{ActionExecutor, BatchOutcome};
use crate::model::{ModelClient, stream_with_retry};
use crate::resolve::resolve_path;
use crate::tasks::{TaskList, TasksDocument};

/// Directory under the project root holding the persisted documents.
const STATE_DIR: &str = ".quill";
/// Task-list document file name.
const TASKS_FILE: &str = "tasks.json";
/// Conversation-history document file name.
const HISTORY_FILE: &str = "history.json";
/// Codebase-index document file name.
const INDEX_FILE: &str = "index.json";

/// Default system instructions when the host supplies none.
const DEFAULT_SYSTEM_INSTRUCTIONS: &str = "You are a careful coding assistant working \
inside the user's project. Ground answers in the provided files and express changes \
through the structured action blocks.";

// ─────────────────────────────────────────────────────────────────────────────
// Outcome types
// ─────────────────────────────────────────────────────────────────────────────

/// Ledger and index statistics for reporting.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    /// Messages currently in the active window.
    pub active_messages: usize,
    /// Messages appended over the session's lifetime.
    pub total_messages: u64,
    /// Completed compression cycles.
    pub compression_count: u64,
    /// Length of the compressed-summary string in characters.
    pub compressed_chars: usize,
    /// Files in the index.
    pub indexed_files: usize,
    /// When the index was last rebuilt (RFC3339).
    pub last_indexed: Option<String>,
}

/// Result of one completed query round.
#[derive(Debug)]
pub struct QueryOutcome {
    /// Plain-text reply for the user (action blocks removed).
    pub reply: String,
    /// Every extracted action, including retrieval requests the host may
    /// still want to surface (web search/fetch).
    pub actions: Vec<Action>,
    /// Outcome of the mutation batch.
    pub batch: BatchOutcome,
    /// Prompt-assembly metadata for the final model call.
    pub assembly: AssemblyMetadata,
}

// ─────────────────────────────────────────────────────────────────────────────
// Session
// ─────────────────────────────────────────────────────────────────────────────

/// One open project session.
pub struct Session {
    project_root: PathBuf,
    config: SessionConfig,
    tokens: TokenLedger,
    index: CodebaseIndex,
    history: ConversationLedger,
    tasks: TaskList,
    system_instructions: String,
    project_instructions: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("project_root", &self.project_root)
            .field("indexed_files", &self.index.len())
            .field("active_messages", &self.history.messages().len())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Open a session with default configuration.
    pub fn open(project_root: impl Into<PathBuf>) -> Result<Self, SessionError> {
        Self::open_with_config(project_root, SessionConfig::default())
    }

    /// Open a session over `project_root`.
    ///
    /// Reads the three persisted documents from the state directory;
    /// absent documents mean empty defaults, and an absent index document
    /// triggers a fresh scan.
    pub fn open_with_config(
        project_root: impl Into<PathBuf>,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        let project_root = project_root.into();
        let state = project_root.join(STATE_DIR);

        let mut index = CodebaseIndex::new(project_root.clone(), &config);
        if let Some(doc) = read_doc::<IndexDocument>(&state.join(INDEX_FILE)) {
            index.load_document(doc);
            info!(files = index.len(), "loaded index from checkpoint");
        } else {
            let files = index.build_index()?;
            info!(files, "indexed project");
        }

        let mut history = ConversationLedger::new(&config);
        if let Some(doc) = read_doc::<HistoryDocument>(&state.join(HISTORY_FILE)) {
            history.load_document(doc);
        }

        let mut tasks = TaskList::new();
        if let Some(doc) = read_doc::<TasksDocument>(&state.join(TASKS_FILE)) {
            tasks.load_document(doc);
        }

        Ok(Self {
            project_root,
            config,
            tokens: TokenLedger::new(),
            index,
            history,
            tasks,
            system_instructions: DEFAULT_SYSTEM_INSTRUCTIONS.to_string(),
            project_instructions: String::new(),
        })
    }

    /// Replace the default system instructions.
    pub fn set_system_instructions(&mut self, instructions: impl Into<String>) {
        self.system_instructions = instructions.into();
    }

    /// Set project-specific instructions appended to the system message.
    pub fn set_project_instructions(&mut self, instructions: impl Into<String>) {
        self.project_instructions = instructions.into();
    }

    /// The session configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The symbol index.
    #[must_use]
    pub fn index(&self) -> &CodebaseIndex {
        &self.index
    }

    /// The conversation ledger.
    #[must_use]
    pub fn history(&self) -> &ConversationLedger {
        &self.history
    }

    /// The task list.
    #[must_use]
    pub fn tasks(&self) -> &TaskList {
        &self.tasks
    }

    /// Record a token-usage reading from the model layer, feeding the
    /// compression trigger.
    pub fn record_usage(&mut self, reading: UsageReading) {
        self.history.record_usage(reading);
    }

    // ── Queries ──────────────────────────────────────────────────────────

    /// Run one query round against the model.
    ///
    /// Assembles the prompt, streams the response, resolves search and
    /// read-range follow-ups into one second model call, appends the
    /// exchange to the ledger, executes the mutation batch fail-fast and
    /// checkpoints. Returns `Ok(None)` on cancellation; nothing is
    /// appended to the ledger in that case.
    pub async fn run_query(
        &mut self,
        client: &dyn ModelClient,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<QueryOutcome>, SessionError> {
        let task_summary = self.tasks.pending_summary();
        let inputs = PromptInputs {
            system_instructions: &self.system_instructions,
            project_instructions: &self.project_instructions,
            task_summary: &task_summary,
            compressed_summary: self.history.compressed(),
            recent_messages: self.history.messages(),
        };
        let assembly =
            PromptAssembler::new(&self.index, &self.tokens, &self.config).build_prompt(query, &inputs);
        let metadata = assembly.metadata;
        let mut messages = assembly.messages;

        let Some(first) = stream_with_retry(client, &messages, &self.config.retry, cancel).await?
        else {
            return Ok(None);
        };
        let mut extraction = parse_tagged(&first);
        let mut final_text = first;

        if let Some(results) = self.follow_up_results(&extraction.actions) {
            debug!("folding follow-up results into a second model call");
            messages.push(ConversationMessage::assistant(final_text));
            messages.push(ConversationMessage::user(results));
            let Some(second) =
                stream_with_retry(client, &messages, &self.config.retry, cancel).await?
            else {
                return Ok(None);
            };
            extraction = parse_tagged(&second);
            final_text = second;
        }

        self.history.append(ConversationMessage::user(query));
        self.history.append(ConversationMessage::assistant(final_text));

        let batch = ActionExecutor::new(&mut self.index, &mut self.tasks).apply(&extraction.actions);
        self.checkpoint()?;

        Ok(Some(QueryOutcome {
            reply: extraction.remainder,
            actions: extraction.actions,
            batch,
            assembly: metadata,
        }))
    }

    /// Resolve search and read-range requests into a results message for
    /// the follow-up round. `None` when the response requested nothing.
    fn follow_up_results(&self, actions: &[Action]) -> Option<String> {
        let mut sections: Vec<String> = Vec::new();
        for action in actions {
            match action {
                Action::SearchRequest { keywords } => {
                    let matches = self.index.search_file_contents(
                        keywords,
                        self.config.simple_context_lines,
                        ContentMode::Simple,
                    );
                    let loaded = self
                        .index
                        .load_files_from_search_results(&matches, self.config.small_file_line_threshold);
                    if loaded.is_empty() {
                        sections.push(format!("No matches for {keywords:?}."));
                    } else {
                        for file in loaded {
                            sections.push(format!("### {}\n\n{}", file.path, file.content));
                        }
                    }
                }
                Action::ReadRangeRequest {
                    path,
                    start_line,
                    end_line,
                } => {
                    let outcome = resolve_path(&self.index, path).and_then(|resolved| {
                        self.index
                            .read_line_range(&resolved, *start_line, *end_line)
                            .map_err(SessionError::from)
                    });
                    match outcome {
                        Ok(range) => sections.push(format!(
                            "### {} (lines {}-{})\n\n{}",
                            range.path, range.start, range.end, range.content
                        )),
                        Err(err) => sections.push(format!("Could not read '{path}': {err}")),
                    }
                }
                _ => {}
            }
        }
        if sections.is_empty() {
            None
        } else {
            Some(format!("Requested context:\n\n{}", sections.join("\n\n")))
        }
    }

    // ── Commands ─────────────────────────────────────────────────────────

    /// Rebuild the index from the filesystem and checkpoint.
    pub fn rebuild_index(&mut self) -> Result<usize, SessionError> {
        let files = self.index.build_index()?;
        info!(files, "index rebuilt");
        self.checkpoint()?;
        Ok(files)
    }

    /// Compress the conversation now, regardless of the trigger, and
    /// checkpoint on success.
    pub async fn compress_now(
        &mut self,
        summarizer: &dyn Summarizer,
    ) -> Result<CompressionOutcome, SessionError> {
        let outcome = self.history.compress(summarizer).await?;
        self.checkpoint()?;
        Ok(outcome)
    }

    /// Compress only if the trigger condition holds.
    pub async fn maybe_compress(
        &mut self,
        summarizer: &dyn Summarizer,
    ) -> Result<CompressionOutcome, SessionError> {
        if !self.history.should_compress(&self.tokens, None) {
            return Ok(CompressionOutcome::NotNeeded);
        }
        self.compress_now(summarizer).await
    }

    /// Clear the conversation history (statistics survive) and checkpoint.
    pub fn clear_history(&mut self) -> Result<(), SessionError> {
        self.history.clear();
        self.checkpoint()
    }

    /// Current ledger and index statistics.
    #[must_use]
    pub fn stats(&self) -> SessionStats {
        let history_stats = self.history.stats();
        SessionStats {
            active_messages: self.history.messages().len(),
            total_messages: history_stats.total_messages,
            compression_count: history_stats.compression_count,
            compressed_chars: self.history.compressed().len(),
            indexed_files: self.index.len(),
            last_indexed: self.index.last_indexed().map(ToString::to_string),
        }
    }

    // ── Persistence ──────────────────────────────────────────────────────

    /// Rewrite the three persisted documents wholesale.
    pub fn checkpoint(&mut self) -> Result<(), SessionError> {
        let state = self.project_root.join(STATE_DIR);
        fs::create_dir_all(&state).map_err(|e| QuillError::io(STATE_DIR, e))?;
        write_doc(&state.join(TASKS_FILE), &self.tasks.to_document())?;
        write_doc(&state.join(HISTORY_FILE), &self.history.to_document())?;
        write_doc(&state.join(INDEX_FILE), &self.index.to_document())?;
        debug!("checkpoint written");
        Ok(())
    }

    /// Checkpoint and close the session.
    pub fn close(mut self) -> Result<(), SessionError> {
        self.checkpoint()
    }
}

fn read_doc<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let raw = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(doc) => Some(doc),
        Err(err) => {
            warn!(path = %path.display(), %err, "ignoring unreadable session document");
            None
        }
    }
}

fn write_doc<T: Serialize>(path: &Path, doc: &T) -> Result<(), SessionError> {
    let json = serde_json::to_string_pretty(doc)
        .map_err(|e| QuillError::internal("serialize-document", e.to_string()))?;
    fs::write(path, json).map_err(|e| QuillError::io(path.display().to_string(), e))?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
