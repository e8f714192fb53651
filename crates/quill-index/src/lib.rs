//! # quill-index
//!
//! The codebase symbol index and search engine.
//!
//! Maintains one [`IndexEntry`] per file under the project root (byte
//! size, modification time, file-type tag, and the extracted function /
//! class / import / export names) and answers three kinds of questions:
//!
//! - **Which files matter for this query?** [`CodebaseIndex::search_files`],
//!   weighted substring scoring with a recency fallback.
//! - **Where exactly does this keyword appear?**
//!   [`CodebaseIndex::search_file_contents`], per-line scanning with
//!   simple, extended, or function-block context extraction.
//! - **What should the prompt actually contain?**
//!   [`CodebaseIndex::load_files_from_search_results`] (the small/large
//!   file split) and [`CodebaseIndex::read_line_range`].
//!
//! Symbol extraction is polymorphic over file type via [`SymbolAnalyzer`];
//! analyzer failure degrades to the generic pattern analyzer rather than
//! aborting the file.

#![deny(unsafe_code)]

pub mod analyzers;
pub mod entry;
pub mod reader;
pub mod scanner;
pub mod search;

pub use analyzers::{SymbolAnalyzer, Symbols, extract_symbols};
pub use entry::{IndexDocument, IndexEntry, SearchMatch};
pub use reader::{LineRange, LoadedFile};
pub use scanner::CodebaseIndex;
pub use search::{ContentMode, FileContentMatches, ScoredFile};
