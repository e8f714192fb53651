//! Shared constants for token estimation, budgeting, and compression.

// =============================================================================
// Token Estimation
// =============================================================================

/// Approximate characters per token when no exact tokenizer is available.
pub const CHARS_PER_TOKEN: usize = 4;

/// Fixed framing overhead added per message when counting a message list.
pub const PER_MESSAGE_OVERHEAD_TOKENS: usize = 4;

/// Fixed tail overhead added once per message list.
pub const LIST_TAIL_OVERHEAD_TOKENS: usize = 3;

// =============================================================================
// Budget Fractions
// =============================================================================

/// Fractions of the available token budget, per prompt section.
///
/// The six fractions sum to 1.0 by construction; any change must keep the
/// sum at or below 1.0.
pub struct BudgetFractions;

impl BudgetFractions {
    /// System instructions share.
    pub const SYSTEM: f64 = 0.05;
    /// Pending-task summary share.
    pub const TASKS: f64 = 0.05;
    /// Compressed-history summary share.
    pub const COMPRESSED_HISTORY: f64 = 0.20;
    /// Recent-history share.
    pub const RECENT_HISTORY: f64 = 0.30;
    /// File-contents share.
    pub const FILE_CONTENTS: f64 = 0.35;
    /// User query share.
    pub const USER_QUERY: f64 = 0.05;
}

// =============================================================================
// Truncation
// =============================================================================

/// Safety margin applied to the ratio-derived initial cut point.
pub const TRUNCATION_SAFETY_MARGIN: f64 = 0.05;

/// Chunk size (chars) removed per iteration while shrinking to a token cap.
pub const TRUNCATION_CHUNK_CHARS: usize = 100;

/// Marker appended to text truncated to a token cap.
pub const TRUNCATION_MARKER: &str = "\n... [truncated]";

// =============================================================================
// Compression
// =============================================================================

/// Separator between successive compressed-history summaries.
pub const SUMMARY_SEPARATOR: &str = "\n\n---\n\n";

// =============================================================================
// Function-block extraction
// =============================================================================

/// Maximum lines scanned in either direction when extracting a function block.
pub const BLOCK_SCAN_LINE_CAP: usize = 60;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_fractions_sum_to_one() {
        let sum = BudgetFractions::SYSTEM
            + BudgetFractions::TASKS
            + BudgetFractions::COMPRESSED_HISTORY
            + BudgetFractions::RECENT_HISTORY
            + BudgetFractions::FILE_CONTENTS
            + BudgetFractions::USER_QUERY;
        assert!(sum <= 1.0 + f64::EPSILON);
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn chars_per_token_is_four() {
        assert_eq!(CHARS_PER_TOKEN, 4);
    }

    #[test]
    fn truncation_marker_non_empty() {
        assert!(!TRUNCATION_MARKER.is_empty());
        assert!(!SUMMARY_SEPARATOR.is_empty());
    }
}
