//! Token budget allocation across prompt sections.

use serde::{Deserialize, Serialize};

use quill_core::constants::BudgetFractions;

/// Named token allocations for one prompt assembly.
///
/// Values are fixed fractions of the available-token quantity; the
/// fractions sum to at most 1.0 by construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBudget {
    /// System instructions allocation.
    pub system_prompt: usize,
    /// Pending-task summary allocation.
    pub task_list: usize,
    /// Compressed-history summary allocation.
    pub compressed_history: usize,
    /// Recent-history allocation.
    pub recent_history: usize,
    /// File-contents allocation.
    pub file_contents: usize,
    /// User-query allocation.
    pub user_query: usize,
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn share(available: usize, fraction: f64) -> usize {
    ((available as f64) * fraction).floor() as usize
}

impl TokenBudget {
    /// Allocate a budget from an available-token quantity.
    #[must_use]
    pub fn allocate(available: usize) -> Self {
        Self {
            system_prompt: share(available, BudgetFractions::SYSTEM),
            task_list: share(available, BudgetFractions::TASKS),
            compressed_history: share(available, BudgetFractions::COMPRESSED_HISTORY),
            recent_history: share(available, BudgetFractions::RECENT_HISTORY),
            file_contents: share(available, BudgetFractions::FILE_CONTENTS),
            user_query: share(available, BudgetFractions::USER_QUERY),
        }
    }

    /// Sum of all section allocations.
    #[must_use]
    pub fn total(&self) -> usize {
        self.system_prompt
            + self.task_list
            + self.compressed_history
            + self.recent_history
            + self.file_contents
            + self.user_query
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
