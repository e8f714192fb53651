//! Token counting and truncation.

use quill_core::constants::{
    CHARS_PER_TOKEN, LIST_TAIL_OVERHEAD_TOKENS, PER_MESSAGE_OVERHEAD_TOKENS,
    TRUNCATION_CHUNK_CHARS, TRUNCATION_MARKER, TRUNCATION_SAFETY_MARGIN,
};
use quill_core::messages::ConversationMessage;

use crate::budget::TokenBudget;

// ─────────────────────────────────────────────────────────────────────────────
// Tokenizer seam
// ─────────────────────────────────────────────────────────────────────────────

/// Exact tokenizer capability.
///
/// `count` returns `None` when the tokenizer cannot handle the input; the
/// ledger then falls back silently to the heuristic estimate. Counting must
/// never raise.
pub trait Tokenizer: Send + Sync {
    /// Count the tokens in `text`, or `None` if unavailable.
    fn count(&self, text: &str) -> Option<usize>;
}

/// Heuristic token estimate: character length over the empirical
/// chars-per-token average, ceiling-rounded.
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

// ─────────────────────────────────────────────────────────────────────────────
// TokenLedger
// ─────────────────────────────────────────────────────────────────────────────

/// The token ledger: counting, availability, allocation, truncation.
#[derive(Default)]
pub struct TokenLedger {
    tokenizer: Option<Box<dyn Tokenizer>>,
}

impl std::fmt::Debug for TokenLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenLedger")
            .field("has_tokenizer", &self.tokenizer.is_some())
            .finish()
    }
}

impl TokenLedger {
    /// Create a ledger with no exact tokenizer (estimation only).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger backed by an exact tokenizer.
    #[must_use]
    pub fn with_tokenizer(tokenizer: Box<dyn Tokenizer>) -> Self {
        Self {
            tokenizer: Some(tokenizer),
        }
    }

    /// Count the tokens in `text`.
    ///
    /// Uses the installed tokenizer when available, else the heuristic
    /// estimate. Never fails.
    #[must_use]
    pub fn count_tokens(&self, text: &str) -> usize {
        self.tokenizer
            .as_ref()
            .and_then(|t| t.count(text))
            .unwrap_or_else(|| estimate_tokens(text))
    }

    /// Count the tokens in a message list, modeling chat-format framing.
    ///
    /// Adds a fixed per-message overhead plus per-field counts, then a
    /// small fixed tail overhead.
    #[must_use]
    pub fn count_messages(&self, messages: &[ConversationMessage]) -> usize {
        let body: usize = messages
            .iter()
            .map(|m| {
                PER_MESSAGE_OVERHEAD_TOKENS
                    + self.count_tokens(&m.role.to_string())
                    + self.count_tokens(&m.content)
            })
            .sum();
        body + LIST_TAIL_OVERHEAD_TOKENS
    }

    /// Tokens available for a prompt given the context window and a
    /// reserved quantity (typically the response margin).
    #[must_use]
    pub fn available_tokens(context_window: usize, reserved: usize) -> usize {
        context_window.saturating_sub(reserved)
    }

    /// Allocate the per-section budget from an available quantity.
    #[must_use]
    pub fn allocate(&self, available: usize) -> TokenBudget {
        TokenBudget::allocate(available)
    }

    /// Truncate `text` so its measured token count is at most `max_tokens`.
    ///
    /// Computes an initial cut point from the token/char ratio with a 5%
    /// safety margin, then chops fixed-size chunks off the end while
    /// re-measuring until under budget. A truncation marker is appended to
    /// any shortened output and is included in the re-measurement, so the
    /// cap holds by measurement.
    #[must_use]
    pub fn truncate_to_limit(&self, text: &str, max_tokens: usize) -> String {
        let current = self.count_tokens(text);
        if current <= max_tokens {
            return text.to_string();
        }
        if max_tokens == 0 {
            return String::new();
        }

        // Initial cut from the observed chars-per-token ratio.
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let mut cut = {
            let ratio = text.len() as f64 / current as f64;
            ((max_tokens as f64) * ratio * (1.0 - TRUNCATION_SAFETY_MARGIN)) as usize
        };
        cut = cut.min(text.len());
        while cut > 0 && !text.is_char_boundary(cut) {
            cut -= 1;
        }

        loop {
            let candidate = format!("{}{}", &text[..cut], TRUNCATION_MARKER);
            if self.count_tokens(&candidate) <= max_tokens {
                return candidate;
            }
            if cut == 0 {
                // Even the marker alone is over budget.
                return String::new();
            }
            cut = cut.saturating_sub(TRUNCATION_CHUNK_CHARS);
            while cut > 0 && !text.is_char_boundary(cut) {
                cut -= 1;
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
