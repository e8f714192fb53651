//! # quill-history
//!
//! The dual-track conversation ledger.
//!
//! One ledger per project session, holding the append-only message window
//! ("full" track) plus a single compressed-summary string. The ledger
//! moves through a small state machine:
//!
//! **Active** (messages appended) → **CompressionDue** (full-window token
//! count exceeds `context_window × threshold`) → **Compressing** (a
//! summarization request covers every message except the newest
//! `keep_recent_count`) → **Active** (window replaced by the kept tail,
//! summary string extended).
//!
//! Invariants:
//!
//! - Compression only ever replaces a *prefix* of the window with an
//!   appended/merged summary; it never reorders or duplicates messages.
//! - The newest `keep_recent_count` messages are never compressed away.
//! - A failing summarization collaborator leaves the ledger unchanged.

#![deny(unsafe_code)]

pub mod ledger;
pub mod types;

pub use ledger::{CompressionOutcome, ConversationLedger, Summarizer};
pub use types::{HistoryDocument, HistoryStats, HistoryTracks};
