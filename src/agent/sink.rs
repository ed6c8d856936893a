//! Outbound response callback for an assistant

use async_trait::async_trait;

/// Receives the assistant's outgoing text: delegation notices while a turn
/// runs, then the final answer.
///
/// Calls arrive in order, so notices always precede the answer they lead up
/// to. Delivery problems are the sink's own business and never reach the
/// turn. Notice delivery is bounded by a timeout; a sink that stalls past it
/// loses that notice but does not hold up the delegation.
#[async_trait]
pub trait ResponseSink: Send + Sync {
    async fn send(&self, text: &str);
}

#[async_trait]
impl<F> ResponseSink for F
where
    F: Fn(&str) + Send + Sync,
{
    async fn send(&self, text: &str) {
        self(text)
    }
}

/// Sink that drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct Discard;

#[async_trait]
impl ResponseSink for Discard {
    async fn send(&self, _text: &str) {}
}
