//! # quill-session
//!
//! The per-project session: one object owning the symbol index, the
//! conversation ledger, the token ledger and the task list, with an
//! explicit `open`/`close` lifecycle and checkpoint persistence.
//!
//! The session drives the query round end to end: prompt assembly,
//! cancellable streamed model calls with retry, a single follow-up round
//! folding search and read-range results back into the model, and
//! fail-fast execution of the extracted mutation batch.

#![deny(unsafe_code)]

pub mod errors;
pub mod executor;
pub mod model;
pub mod resolve;
pub mod session;
pub mod tasks;

pub use errors::SessionError;
pub use executor::{ActionExecutor, BatchOutcome};
pub use model::{ModelClient, TextStream, collect_stream, complete_with_retry, stream_with_retry};
pub use resolve::resolve_path;
pub use session::{QueryOutcome, Session, SessionStats};
pub use tasks::{TaskItem, TaskList, TasksDocument};
