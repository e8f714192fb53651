//! # quill-actions
//!
//! Action extraction from model responses.
//!
//! The model speaks two surface grammars: XML-ish tagged blocks embedded
//! in prose, and structured tool calls with JSON arguments. Both parse
//! into the same canonical [`Action`] set so the executor downstream is
//! grammar-agnostic. Parsing never fails: malformed or unknown blocks
//! and calls are skipped, and the surviving prose is returned as the
//! extraction remainder.

#![deny(unsafe_code)]

pub mod action;
pub mod calls;
pub mod paths;
pub mod tagged;

pub use action::{Action, Extraction, TaskStatus};
pub use calls::{ToolCall, parse_tool_calls};
pub use paths::normalize_path;
pub use tagged::parse_tagged;
