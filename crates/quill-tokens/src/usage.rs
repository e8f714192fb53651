//! Real token-usage readings reported by the model endpoint.

use serde::{Deserialize, Serialize};

/// A real usage reading from the most recent model exchange.
///
/// The conversation ledger prefers these readings over a live re-count
/// when deciding whether compression is due, since the endpoint's numbers
/// reflect the true tokenizer rather than the heuristic estimate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageReading {
    /// Tokens occupied by the current context.
    pub context_tokens: usize,
    /// Context window ceiling at the time of the reading.
    pub context_window: usize,
    /// When the reading was taken (RFC3339).
    pub taken_at: String,
}

impl UsageReading {
    /// Create a reading timestamped now.
    #[must_use]
    pub fn new(context_tokens: usize, context_window: usize) -> Self {
        Self {
            context_tokens,
            context_window,
            taken_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Usage as a ratio of the window (0.0 when the window is zero).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn ratio(&self) -> f64 {
        if self.context_window == 0 {
            return 0.0;
        }
        self.context_tokens as f64 / self.context_window as f64
    }
}
