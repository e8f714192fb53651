//! The model-client seam: completion, streaming, retry, cancellation.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use quill_core::errors::ModelError;
use quill_core::messages::ConversationMessage;
use quill_core::retry::RetryPolicy;

/// A cancellable sequence of streamed text increments.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, ModelError>> + Send>>;

/// Language-model collaborator.
///
/// The session owns the conversation shape; implementors only turn a
/// message list into text. `stream` yields text increments so the caller
/// can check cancellation between chunks.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// One-shot completion.
    async fn complete(&self, messages: &[ConversationMessage]) -> Result<String, ModelError>;

    /// Streamed completion.
    async fn stream(&self, messages: &[ConversationMessage]) -> Result<TextStream, ModelError>;
}

/// Call `complete` with the retry schedule.
///
/// Retries only transient categories (network, server), up to the
/// policy's attempt count with exponential backoff. Connection-refused
/// and client errors surface immediately.
pub async fn complete_with_retry(
    client: &dyn ModelClient,
    messages: &[ConversationMessage],
    policy: &RetryPolicy,
) -> Result<String, ModelError> {
    let mut attempt = 0u32;
    loop {
        match client.complete(messages).await {
            Ok(text) => return Ok(text),
            Err(err) => {
                if !policy.should_retry(err.category, attempt) {
                    return Err(err);
                }
                let delay_ms = policy.backoff_delay_ms(attempt);
                warn!(attempt, delay_ms, error = %err, "model call failed, retrying");
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                attempt += 1;
            }
        }
    }
}

/// Drain a text stream into one response string.
///
/// Cancellation is checked between increments. On cancel the partial
/// text is discarded and `Ok(None)` is returned, so the caller appends
/// nothing to the conversation ledger.
pub async fn collect_stream(
    mut stream: TextStream,
    cancel: &CancellationToken,
) -> Result<Option<String>, ModelError> {
    let mut text = String::new();
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(partial_chars = text.len(), "stream cancelled, discarding partial text");
                return Ok(None);
            }
            chunk = stream.next() => match chunk {
                Some(Ok(piece)) => text.push_str(&piece),
                Some(Err(err)) => return Err(err),
                None => return Ok(Some(text)),
            }
        }
    }
}

/// Stream a response with the retry schedule applied to the initial
/// connection. Chunk-level errors mid-stream are not retried.
pub async fn stream_with_retry(
    client: &dyn ModelClient,
    messages: &[ConversationMessage],
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<Option<String>, ModelError> {
    let mut attempt = 0u32;
    let stream = loop {
        match client.stream(messages).await {
            Ok(stream) => break stream,
            Err(err) => {
                if !policy.should_retry(err.category, attempt) {
                    return Err(err);
                }
                let delay_ms = policy.backoff_delay_ms(attempt);
                warn!(attempt, delay_ms, error = %err, "stream open failed, retrying");
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                attempt += 1;
            }
        }
    };
    collect_stream(stream, cancel).await
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use quill_core::errors::ErrorCategory;

    use super::*;

    /// Client that fails a fixed number of times before succeeding.
    struct FlakyClient {
        failures: u32,
        category: ErrorCategory,
        calls: AtomicU32,
    }

    impl FlakyClient {
        fn new(failures: u32, category: ErrorCategory) -> Self {
            Self {
                failures,
                category,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl ModelClient for FlakyClient {
        async fn complete(&self, _messages: &[ConversationMessage]) -> Result<String, ModelError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(ModelError::new("boom").with_category(self.category))
            } else {
                Ok("recovered".to_string())
            }
        }

        async fn stream(&self, _messages: &[ConversationMessage]) -> Result<TextStream, ModelError> {
            Ok(Box::pin(futures::stream::iter(vec![
                Ok("chunk one ".to_string()),
                Ok("chunk two".to_string()),
            ])))
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            base_delay_ms: 1,
        }
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let client = FlakyClient::new(2, ErrorCategory::Network);
        let out = complete_with_retry(&client, &[], &fast_policy()).await.unwrap();
        assert_eq!(out, "recovered");
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn connection_refused_is_not_retried() {
        let client = FlakyClient::new(1, ErrorCategory::ConnectionRefused);
        let err = complete_with_retry(&client, &[], &fast_policy()).await.unwrap_err();
        assert_eq!(err.category, ErrorCategory::ConnectionRefused);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn client_error_is_not_retried() {
        let client = FlakyClient::new(5, ErrorCategory::Client);
        assert!(complete_with_retry(&client, &[], &fast_policy()).await.is_err());
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_exhaust_after_max_attempts() {
        let client = FlakyClient::new(10, ErrorCategory::Server);
        assert!(complete_with_retry(&client, &[], &fast_policy()).await.is_err());
        // Initial call plus three retries.
        assert_eq!(client.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn stream_collects_all_chunks() {
        let client = FlakyClient::new(0, ErrorCategory::Network);
        let cancel = CancellationToken::new();
        let out = stream_with_retry(&client, &[], &fast_policy(), &cancel)
            .await
            .unwrap();
        assert_eq!(out.as_deref(), Some("chunk one chunk two"));
    }

    #[tokio::test]
    async fn cancelled_stream_discards_partial_text() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let stream: TextStream = Box::pin(futures::stream::pending());
        let out = collect_stream(stream, &cancel).await.unwrap();
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn mid_stream_error_surfaces() {
        let stream: TextStream = Box::pin(futures::stream::iter(vec![
            Ok("partial ".to_string()),
            Err(ModelError::new("connection reset")),
        ]));
        let cancel = CancellationToken::new();
        assert!(collect_stream(stream, &cancel).await.is_err());
    }
}
