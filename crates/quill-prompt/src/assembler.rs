//! Prompt assembly.
//!
//! One assembly per user query. Sections are laid down in a fixed order,
//! file contents are included greedily against the file-content budget,
//! and an over-budget result is resolved by the degrade ladder rather
//! than an error.

use std::fs;

use serde::Serialize;
use tracing::{debug, warn};

use quill_core::config::SessionConfig;
use quill_core::messages::ConversationMessage;
use quill_index::CodebaseIndex;
use quill_tokens::{TokenBudget, TokenLedger};

// ─────────────────────────────────────────────────────────────────────────────
// Inputs and outputs
// ─────────────────────────────────────────────────────────────────────────────

/// Session-held content feeding one prompt assembly.
#[derive(Clone, Copy, Debug, Default)]
pub struct PromptInputs<'a> {
    /// Primary system instructions. Never dropped.
    pub system_instructions: &'a str,
    /// Optional project-specific instructions appended to the system
    /// message (empty ⇒ omitted).
    pub project_instructions: &'a str,
    /// Pending-task summary appended to the system message (empty ⇒
    /// omitted).
    pub task_summary: &'a str,
    /// Compressed-history summary (empty ⇒ no summary message).
    pub compressed_summary: &'a str,
    /// Kept recent conversation messages, oldest first.
    pub recent_messages: &'a [ConversationMessage],
}

/// Metadata reported alongside every assembled prompt.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssemblyMetadata {
    /// Measured token count of the final message list.
    pub total_tokens: usize,
    /// Tokens available after the response reservation.
    pub tokens_available: usize,
    /// The per-section budget derived for this assembly.
    pub budget: TokenBudget,
    /// Files included in the relevant-files message (truncated tail
    /// counts as included).
    pub files_included: usize,
    /// Recent-history messages surviving assembly.
    pub history_messages_included: usize,
    /// Whether a compressed-history summary message was present.
    pub had_compressed_history: bool,
    /// Whether the degrade ladder removed anything.
    pub was_reduced: bool,
}

/// An assembled prompt: the ordered message list plus metadata.
#[derive(Debug)]
pub struct PromptAssembly {
    /// Messages in final order.
    pub messages: Vec<ConversationMessage>,
    /// Assembly metadata.
    pub metadata: AssemblyMetadata,
}

/// Which ladder rung a message belongs to. Only history messages and the
/// relevant-files message are droppable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Section {
    Pinned,
    Files,
    History,
}

// ─────────────────────────────────────────────────────────────────────────────
// Assembler
// ─────────────────────────────────────────────────────────────────────────────

/// Builds one prompt per user query from the session's index, ledger and
/// configuration.
#[derive(Debug)]
pub struct PromptAssembler<'a> {
    index: &'a CodebaseIndex,
    ledger: &'a TokenLedger,
    config: &'a SessionConfig,
}

impl<'a> PromptAssembler<'a> {
    /// Create an assembler borrowing the session's shared state.
    #[must_use]
    pub fn new(index: &'a CodebaseIndex, ledger: &'a TokenLedger, config: &'a SessionConfig) -> Self {
        Self {
            index,
            ledger,
            config,
        }
    }

    /// Assemble the prompt for `query`.
    ///
    /// Section order: system instructions (+ project instructions and
    /// task summary), compressed-history summary, relevant files, recent
    /// history, the query. If the measured total exceeds the available
    /// tokens the degrade ladder fires: oldest history messages drop
    /// first, then the whole relevant-files message. The primary system
    /// message and the query are never dropped.
    #[must_use]
    pub fn build_prompt(&self, query: &str, inputs: &PromptInputs<'_>) -> PromptAssembly {
        let available = TokenLedger::available_tokens(
            self.config.context_window,
            self.config.reserved_response_tokens,
        );
        let budget = self.ledger.allocate(available);

        let mut parts: Vec<(Section, ConversationMessage)> = Vec::new();
        parts.push((
            Section::Pinned,
            ConversationMessage::system(self.system_text(inputs)),
        ));

        let had_compressed_history = !inputs.compressed_summary.is_empty();
        if had_compressed_history {
            parts.push((
                Section::Pinned,
                ConversationMessage::system(format!(
                    "Summary of the earlier conversation:\n\n{}",
                    inputs.compressed_summary
                )),
            ));
        }

        let (files_text, mut files_included) = self.files_section(query, budget.file_contents);
        if let Some(text) = files_text {
            parts.push((Section::Files, ConversationMessage::system(text)));
        }

        for message in inputs.recent_messages {
            parts.push((Section::History, message.clone()));
        }

        parts.push((Section::Pinned, ConversationMessage::user(query)));

        // Degrade ladder. Rung 1: oldest history messages. Rung 2: the
        // relevant-files message. Pinned messages never drop.
        let measure = |parts: &[(Section, ConversationMessage)]| {
            let messages: Vec<ConversationMessage> =
                parts.iter().map(|(_, m)| m.clone()).collect();
            self.ledger.count_messages(&messages)
        };
        let mut total = measure(&parts);
        let mut was_reduced = false;

        while total > available {
            let Some(pos) = parts.iter().position(|(s, _)| *s == Section::History) else {
                break;
            };
            let _ = parts.remove(pos);
            was_reduced = true;
            total = measure(&parts);
        }
        if total > available {
            if let Some(pos) = parts.iter().position(|(s, _)| *s == Section::Files) {
                let _ = parts.remove(pos);
                files_included = 0;
                was_reduced = true;
                total = measure(&parts);
            }
        }
        if was_reduced {
            debug!(total, available, "prompt reduced to fit the token budget");
        }
        if total > available {
            warn!(total, available, "prompt exceeds budget even at ladder minimum");
        }

        let history_messages_included = parts
            .iter()
            .filter(|(s, _)| *s == Section::History)
            .count();
        let messages = parts.into_iter().map(|(_, m)| m).collect();

        PromptAssembly {
            messages,
            metadata: AssemblyMetadata {
                total_tokens: total,
                tokens_available: available,
                budget,
                files_included,
                history_messages_included,
                had_compressed_history,
                was_reduced,
            },
        }
    }

    fn system_text(&self, inputs: &PromptInputs<'_>) -> String {
        let mut text = inputs.system_instructions.to_string();
        if !inputs.project_instructions.is_empty() {
            text.push_str("\n\n");
            text.push_str(inputs.project_instructions);
        }
        if !inputs.task_summary.is_empty() {
            text.push_str("\n\nPending tasks:\n");
            text.push_str(inputs.task_summary);
        }
        text
    }

    /// Builds the relevant-files message body by greedy inclusion.
    ///
    /// Each candidate is appended whole while it fits the remaining
    /// file-content budget. The first candidate that does not fit is
    /// appended as a truncated tail and inclusion stops, so no file is
    /// ever split across partial inclusions.
    fn files_section(&self, query: &str, file_budget: usize) -> (Option<String>, usize) {
        let results = self.index.search_files(query, self.config.search_limit);
        if results.is_empty() {
            return (None, 0);
        }

        let mut blocks: Vec<String> = Vec::new();
        let mut included = 0usize;
        let mut remaining = file_budget;

        for scored in &results {
            let Some(entry) = self.index.get(&scored.path) else {
                continue;
            };
            if entry.skipped {
                continue;
            }
            let Ok(content) = fs::read_to_string(self.index.abs_path(&scored.path)) else {
                debug!(path = %scored.path, "skipping unreadable file during assembly");
                continue;
            };
            let block = format!("### {}\n\n{}", scored.path, content);
            let tokens = self.ledger.count_tokens(&block);
            if tokens <= remaining {
                remaining -= tokens;
                blocks.push(block);
                included += 1;
            } else {
                let tail = self.ledger.truncate_to_limit(&block, remaining);
                if !tail.is_empty() {
                    blocks.push(tail);
                    included += 1;
                }
                break;
            }
        }

        if blocks.is_empty() {
            return (None, 0);
        }
        let body = format!(
            "Relevant files from the codebase:\n\n{}",
            blocks.join("\n\n")
        );
        (Some(body), included)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
