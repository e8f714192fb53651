//! # quill-core
//!
//! Shared foundation for the Quill context engine.
//!
//! Quill is the retrieval-and-context engine behind an interactive coding
//! assistant: it decides which parts of a codebase and which prior
//! conversation to show a language model, stays within a hard token budget,
//! and translates the model's structured output back into concrete file
//! operations.
//!
//! This crate holds the pieces every other Quill crate needs:
//!
//! - [`messages`]: conversation message types (role, content, timestamp)
//! - [`errors`]: the structured error hierarchy built on [`thiserror`]
//! - [`retry`]: error classification and the fixed backoff schedule
//! - [`logging`]: `tracing` subscriber initialization
//! - [`constants`]: token estimation and budgeting constants
//! - [`config`]: per-session configuration with serde defaults

#![deny(unsafe_code)]

pub mod config;
pub mod constants;
pub mod errors;
pub mod logging;
pub mod messages;
pub mod retry;

pub use config::SessionConfig;
pub use errors::{QuillError, RangeError};
pub use messages::{ConversationMessage, Role};
