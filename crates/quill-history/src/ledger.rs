//! The conversation ledger and its compression cycle.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use quill_core::config::SessionConfig;
use quill_core::constants::SUMMARY_SEPARATOR;
use quill_core::errors::ModelError;
use quill_core::messages::ConversationMessage;
use quill_tokens::{TokenLedger, UsageReading};

use crate::types::{HistoryDocument, HistoryStats, HistoryTracks};

// ─────────────────────────────────────────────────────────────────────────────
// Summarizer seam
// ─────────────────────────────────────────────────────────────────────────────

/// Summarization collaborator: condenses aged messages into prose.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize `messages` into a compact summary string.
    async fn summarize(&self, messages: &[ConversationMessage]) -> Result<String, ModelError>;
}

/// Outcome of one compression attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompressionOutcome {
    /// The window was short enough that nothing needed compressing.
    NotNeeded,
    /// A summary was produced and the window truncated to the kept tail.
    Compressed {
        /// Messages folded into the summary.
        messages_compressed: usize,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// ConversationLedger
// ─────────────────────────────────────────────────────────────────────────────

/// The dual-track conversation ledger for one project session.
#[derive(Debug)]
pub struct ConversationLedger {
    full: Vec<ConversationMessage>,
    compressed: String,
    keep_recent_count: usize,
    compression_threshold: f64,
    context_window: usize,
    last_usage: Option<UsageReading>,
    stats: HistoryStats,
}

impl ConversationLedger {
    /// Create an empty ledger from session configuration.
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            full: Vec::new(),
            compressed: String::new(),
            keep_recent_count: config.keep_recent_count,
            compression_threshold: config.compression_threshold,
            context_window: config.context_window,
            last_usage: None,
            stats: HistoryStats::default(),
        }
    }

    /// Append a message to the full window.
    pub fn append(&mut self, message: ConversationMessage) {
        self.full.push(message);
        self.stats.total_messages += 1;
    }

    /// The full (uncompressed) window, in insertion order.
    #[must_use]
    pub fn messages(&self) -> &[ConversationMessage] {
        &self.full
    }

    /// The compressed-summary string (empty if nothing was compressed).
    #[must_use]
    pub fn compressed(&self) -> &str {
        &self.compressed
    }

    /// Ledger statistics.
    #[must_use]
    pub fn stats(&self) -> HistoryStats {
        self.stats
    }

    /// Number of newest messages never compressed away.
    #[must_use]
    pub fn keep_recent_count(&self) -> usize {
        self.keep_recent_count
    }

    /// Record a real usage reading from the latest model exchange.
    pub fn record_usage(&mut self, reading: UsageReading) {
        self.last_usage = Some(reading);
    }

    /// Drop all history (both tracks). Statistics survive.
    pub fn clear(&mut self) {
        self.full.clear();
        self.compressed.clear();
        self.last_usage = None;
    }

    /// Whether compression is due.
    ///
    /// Accepts an override for the current/ceiling token counts; defaults
    /// to the most recent real usage reading when available, falling back
    /// to a live re-count of the full window. Never true when the window
    /// has at most `keep_recent_count` messages.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn should_compress(&self, tokens: &TokenLedger, override_counts: Option<(usize, usize)>) -> bool {
        if self.full.len() <= self.keep_recent_count {
            return false;
        }

        let (current, ceiling) = override_counts.unwrap_or_else(|| {
            self.last_usage.as_ref().map_or_else(
                || (tokens.count_messages(&self.full), self.context_window),
                |usage| (usage.context_tokens, usage.context_window),
            )
        });

        (current as f64) > (ceiling as f64) * self.compression_threshold
    }

    /// Run one compression cycle through the summarization collaborator.
    ///
    /// Everything except the newest `keep_recent_count` messages is
    /// summarized; on success the summary is appended to the compressed
    /// track (after a separator when one already exists) and the window is
    /// truncated to the kept tail. On failure the ledger is left
    /// unchanged and the error is propagated.
    pub async fn compress(&mut self, summarizer: &dyn Summarizer) -> Result<CompressionOutcome, ModelError> {
        if self.full.len() <= self.keep_recent_count {
            debug!(window = self.full.len(), keep = self.keep_recent_count, "compression not needed");
            return Ok(CompressionOutcome::NotNeeded);
        }

        let split = self.full.len() - self.keep_recent_count;
        let aged = &self.full[..split];

        let summary = match summarizer.summarize(aged).await {
            Ok(summary) => summary,
            Err(err) => {
                warn!(%err, "compression failed, ledger left unchanged");
                return Err(err);
            }
        };

        if self.compressed.is_empty() {
            self.compressed = summary;
        } else {
            self.compressed.push_str(SUMMARY_SEPARATOR);
            self.compressed.push_str(&summary);
        }
        self.full.drain(..split);
        self.stats.compression_count += 1;
        self.last_usage = None;

        info!(messages_compressed = split, kept = self.full.len(), "history compressed");
        Ok(CompressionOutcome::Compressed {
            messages_compressed: split,
        })
    }

    // ── Persistence ──

    /// Snapshot the ledger as a persisted document.
    #[must_use]
    pub fn to_document(&self) -> HistoryDocument {
        HistoryDocument {
            history: HistoryTracks {
                full: self.full.clone(),
                compressed: self.compressed.clone(),
                active_window: self.keep_recent_count,
            },
            last_saved: Some(chrono::Utc::now().to_rfc3339()),
            stats: self.stats,
        }
    }

    /// Restore both tracks from a persisted document.
    pub fn load_document(&mut self, doc: HistoryDocument) {
        self.full = doc.history.full;
        self.compressed = doc.history.compressed;
        self.stats = doc.stats;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSummarizer(&'static str);

    #[async_trait]
    impl Summarizer for FixedSummarizer {
        async fn summarize(&self, _messages: &[ConversationMessage]) -> Result<String, ModelError> {
            Ok(self.0.to_string())
        }
    }

    struct FailingSummarizer;

    #[async_trait]
    impl Summarizer for FailingSummarizer {
        async fn summarize(&self, _messages: &[ConversationMessage]) -> Result<String, ModelError> {
            Err(ModelError::new("request timed out"))
        }
    }

    /// Echoes the number of messages it was asked to summarize.
    struct CountingSummarizer;

    #[async_trait]
    impl Summarizer for CountingSummarizer {
        async fn summarize(&self, messages: &[ConversationMessage]) -> Result<String, ModelError> {
            Ok(format!("summarized {} messages", messages.len()))
        }
    }

    fn config_keeping(keep: usize) -> SessionConfig {
        let mut config = SessionConfig::default();
        config.keep_recent_count = keep;
        config
    }

    fn filled_ledger(total: usize, keep: usize) -> ConversationLedger {
        let mut ledger = ConversationLedger::new(&config_keeping(keep));
        for i in 0..total {
            ledger.append(ConversationMessage::user(format!("message {i}")));
        }
        ledger
    }

    // -- append / stats --

    #[test]
    fn append_preserves_order() {
        let ledger = filled_ledger(3, 6);
        let contents: Vec<&str> = ledger.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["message 0", "message 1", "message 2"]);
        assert_eq!(ledger.stats().total_messages, 3);
    }

    // -- should_compress --

    #[test]
    fn no_compression_when_window_small() {
        let ledger = filled_ledger(6, 6);
        let tokens = TokenLedger::new();
        // Even a huge override can't trigger with window <= keep.
        assert!(!ledger.should_compress(&tokens, Some((1_000_000, 100))));
    }

    #[test]
    fn override_counts_drive_decision() {
        let ledger = filled_ledger(10, 6);
        let tokens = TokenLedger::new();
        assert!(ledger.should_compress(&tokens, Some((71, 100))));
        assert!(!ledger.should_compress(&tokens, Some((69, 100))));
    }

    #[test]
    fn usage_reading_preferred_over_live_count() {
        let mut ledger = filled_ledger(10, 6);
        let tokens = TokenLedger::new();
        // Live count of ten short messages is far below threshold, but the
        // endpoint reported a nearly full window.
        ledger.record_usage(UsageReading::new(90_000, 100_000));
        assert!(ledger.should_compress(&tokens, None));
    }

    #[test]
    fn live_count_used_without_reading() {
        let mut config = config_keeping(2);
        config.context_window = 10;
        let mut ledger = ConversationLedger::new(&config);
        for _ in 0..5 {
            ledger.append(ConversationMessage::user("a fairly long message body here"));
        }
        let tokens = TokenLedger::new();
        // 5 messages of ~12 tokens each against a 10-token window.
        assert!(ledger.should_compress(&tokens, None));
    }

    // -- compress --

    #[tokio::test]
    async fn compress_noop_when_window_at_keep_count() {
        let mut ledger = filled_ledger(6, 6);
        let outcome = ledger.compress(&FixedSummarizer("s")).await.unwrap();
        assert_eq!(outcome, CompressionOutcome::NotNeeded);
        assert_eq!(ledger.messages().len(), 6);
        assert!(ledger.compressed().is_empty());
    }

    #[tokio::test]
    async fn compress_keeps_recent_tail() {
        let mut ledger = filled_ledger(10, 6);
        let outcome = ledger.compress(&CountingSummarizer).await.unwrap();
        assert_eq!(outcome, CompressionOutcome::Compressed { messages_compressed: 4 });
        assert_eq!(ledger.messages().len(), 6);
        assert_eq!(ledger.messages()[0].content, "message 4");
        assert_eq!(ledger.compressed(), "summarized 4 messages");
        assert_eq!(ledger.stats().compression_count, 1);
    }

    #[tokio::test]
    async fn second_compression_appends_after_separator() {
        let mut ledger = filled_ledger(10, 6);
        let _ = ledger.compress(&FixedSummarizer("first")).await.unwrap();
        for i in 10..14 {
            ledger.append(ConversationMessage::user(format!("message {i}")));
        }
        let _ = ledger.compress(&FixedSummarizer("second")).await.unwrap();
        assert_eq!(ledger.compressed(), format!("first{SUMMARY_SEPARATOR}second"));
    }

    #[tokio::test]
    async fn failed_compression_leaves_ledger_unchanged() {
        let mut ledger = filled_ledger(10, 6);
        let before: Vec<ConversationMessage> = ledger.messages().to_vec();
        let result = ledger.compress(&FailingSummarizer).await;
        assert!(result.is_err());
        assert_eq!(ledger.messages(), before.as_slice());
        assert!(ledger.compressed().is_empty());
        assert_eq!(ledger.stats().compression_count, 0);
    }

    #[tokio::test]
    async fn compress_resets_usage_reading() {
        let mut ledger = filled_ledger(10, 2);
        ledger.record_usage(UsageReading::new(90_000, 100_000));
        let _ = ledger.compress(&FixedSummarizer("s")).await.unwrap();
        let tokens = TokenLedger::new();
        // The stale reading is gone; the live count of 2 short messages is
        // far under threshold.
        assert!(!ledger.should_compress(&tokens, None));
    }

    // -- clear / persistence --

    #[test]
    fn clear_drops_both_tracks() {
        let mut ledger = filled_ledger(4, 2);
        ledger.clear();
        assert!(ledger.messages().is_empty());
        assert!(ledger.compressed().is_empty());
        assert_eq!(ledger.stats().total_messages, 4);
    }

    #[tokio::test]
    async fn document_roundtrip() {
        let mut ledger = filled_ledger(10, 6);
        let _ = ledger.compress(&FixedSummarizer("old context")).await.unwrap();

        let doc = ledger.to_document();
        assert_eq!(doc.history.full.len(), 6);
        assert_eq!(doc.history.compressed, "old context");
        assert_eq!(doc.history.active_window, 6);
        assert!(doc.last_saved.is_some());

        let mut restored = ConversationLedger::new(&config_keeping(6));
        restored.load_document(doc);
        assert_eq!(restored.messages().len(), 6);
        assert_eq!(restored.compressed(), "old context");
        assert_eq!(restored.stats().compression_count, 1);
    }
}
