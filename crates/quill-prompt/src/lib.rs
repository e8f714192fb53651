//! # quill-prompt
//!
//! The prompt assembler.
//!
//! Turns the session's shared state (symbol index, token ledger,
//! conversation tracks, configuration) plus a user query into a single
//! ordered message list, sized to the live context window. Over-budget
//! assemblies are resolved by a degrade ladder, never by an error: the
//! oldest recent-history messages drop first, then the relevant-files
//! message, and the outcome is always reported in the assembly metadata.

#![deny(unsafe_code)]

pub mod assembler;

pub use assembler::{AssemblyMetadata, PromptAssembler, PromptAssembly, PromptInputs};
