//! Persisted history document types.
//!
//! The history document is rewritten wholesale at each checkpoint and read
//! back at session start (absent file ⇒ empty default). All serializable
//! types use `camelCase` for wire compatibility.

use serde::{Deserialize, Serialize};

use quill_core::messages::ConversationMessage;

/// Ledger statistics carried in the persisted document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStats {
    /// Messages appended over the ledger's lifetime.
    pub total_messages: u64,
    /// Completed compression cycles.
    pub compression_count: u64,
}

/// The two history tracks as persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryTracks {
    /// The full (uncompressed) message window.
    #[serde(default)]
    pub full: Vec<ConversationMessage>,
    /// The compressed-summary string (empty when nothing was compressed).
    #[serde(default)]
    pub compressed: String,
    /// Number of newest messages kept out of compression.
    #[serde(default)]
    pub active_window: usize,
}

/// Persisted conversation-history document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryDocument {
    /// The two tracks.
    #[serde(default)]
    pub history: HistoryTracks,
    /// When the document was last saved (RFC3339).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_saved: Option<String>,
    /// Ledger statistics.
    #[serde(default)]
    pub stats: HistoryStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_document_is_empty() {
        let doc = HistoryDocument::default();
        assert!(doc.history.full.is_empty());
        assert!(doc.history.compressed.is_empty());
        assert!(doc.last_saved.is_none());
        assert_eq!(doc.stats.total_messages, 0);
    }

    #[test]
    fn document_serde_camel_case() {
        let doc = HistoryDocument {
            history: HistoryTracks {
                full: vec![ConversationMessage::user("hi")],
                compressed: "earlier things".into(),
                active_window: 6,
            },
            last_saved: Some("2025-01-01T00:00:00Z".into()),
            stats: HistoryStats {
                total_messages: 3,
                compression_count: 1,
            },
        };
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("activeWindow"));
        assert!(json.contains("lastSaved"));
        assert!(json.contains("compressionCount"));
    }

    #[test]
    fn document_tolerates_empty_json() {
        let doc: HistoryDocument = serde_json::from_str("{}").unwrap();
        assert_eq!(doc, HistoryDocument::default());
    }
}
