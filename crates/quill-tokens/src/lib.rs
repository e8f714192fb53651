//! # quill-tokens
//!
//! The token ledger: counting, estimation, budget allocation, and
//! truncation to a token cap.
//!
//! The ledger is the one component every other part of the engine consults
//! before putting text in front of the model:
//!
//! 1. **Counting**: exact counts through an installed [`Tokenizer`],
//!    falling back silently to a chars-per-token estimate.
//! 2. **Allocation**: splitting the available token quantity across the
//!    six prompt sections with fixed fractions.
//! 3. **Truncation**: shrinking text until its *measured* count fits a
//!    cap; the guarantee is by re-measurement, never by the ratio estimate.
//!
//! # Usage
//!
//! ```
//! use quill_tokens::TokenLedger;
//!
//! let ledger = TokenLedger::new();
//! let available = TokenLedger::available_tokens(128_000, 4_096);
//! let budget = ledger.allocate(available);
//! assert!(budget.total() <= available);
//! ```

#![deny(unsafe_code)]

pub mod budget;
pub mod ledger;
pub mod usage;

pub use budget::TokenBudget;
pub use ledger::{TokenLedger, Tokenizer, estimate_tokens};
pub use usage::UsageReading;
