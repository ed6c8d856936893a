//! Channel abstraction for message I/O
//!
//! A channel receives user text from some messaging surface and delivers
//! replies back to it. Channels are started and stopped together.

pub mod bridge;

use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;

use crate::core::{ForemanError, Result};

pub use bridge::{deliver, ChannelResponder, SessionBridge};

/// A messaging surface the application serves
#[async_trait]
pub trait Channel: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the channel has what it needs to start
    async fn validate_configuration(&self) -> bool;

    async fn start(&self) -> Result<()>;

    async fn stop(&self) -> Result<()>;
}

/// Outgoing side of a channel
#[async_trait]
pub trait OutboundSink: Send + Sync {
    async fn send_text(&self, session_id: &str, text: &str) -> Result<()>;

    async fn send_file(&self, session_id: &str, bytes: Vec<u8>, filename: &str) -> Result<()>;
}

/// Starts and stops every registered channel
#[derive(Default)]
pub struct ChannelManager {
    channels: Vec<Arc<dyn Channel>>,
}

impl ChannelManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_channel(&mut self, channel: Arc<dyn Channel>) {
        tracing::info!(channel = channel.name(), "Adding channel");
        self.channels.push(channel);
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Start all channels concurrently.
    ///
    /// Channels with invalid configuration are skipped. A failing channel
    /// does not stop the others; all failures are reported together.
    pub async fn start_all(&self) -> Result<()> {
        let results = join_all(self.channels.iter().map(|c| Self::start_channel(c.as_ref()))).await;
        self.collect("start", results)?;

        tracing::info!("All channels started");
        Ok(())
    }

    /// Stop all channels concurrently
    pub async fn stop_all(&self) -> Result<()> {
        let results = join_all(self.channels.iter().map(|c| c.stop())).await;
        self.collect("stop", results)?;

        tracing::info!("All channels stopped");
        Ok(())
    }

    async fn start_channel(channel: &dyn Channel) -> Result<()> {
        if !channel.validate_configuration().await {
            tracing::warn!(
                channel = channel.name(),
                "Channel configuration is not valid, not starting"
            );
            return Ok(());
        }

        channel.start().await
    }

    fn collect(&self, action: &str, results: Vec<Result<()>>) -> Result<()> {
        let failures: Vec<String> = self
            .channels
            .iter()
            .zip(results)
            .filter_map(|(channel, result)| {
                result.err().map(|e| {
                    tracing::error!(channel = channel.name(), error = %e, "Failed to {}", action);
                    format!("{}: {}", channel.name(), e)
                })
            })
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ForemanError::channel(format!(
                "failed to {} {}",
                action,
                failures.join("; ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Stub {
        name: &'static str,
        valid: bool,
        fail: bool,
        started: AtomicBool,
    }

    impl Stub {
        fn new(name: &'static str, valid: bool, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                name,
                valid,
                fail,
                started: AtomicBool::new(false),
            })
        }
    }

    #[async_trait]
    impl Channel for Stub {
        fn name(&self) -> &str {
            self.name
        }

        async fn validate_configuration(&self) -> bool {
            self.valid
        }

        async fn start(&self) -> Result<()> {
            if self.fail {
                return Err(ForemanError::channel("login refused"));
            }
            self.started.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn stop(&self) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_one_failure_does_not_block_others() {
        let good = Stub::new("good", true, false);
        let bad = Stub::new("bad", true, true);
        let skipped = Stub::new("skipped", false, false);

        let mut manager = ChannelManager::new();
        manager.add_channel(bad.clone());
        manager.add_channel(good.clone());
        manager.add_channel(skipped.clone());

        assert_eq!(manager.len(), 3);

        let err = manager.start_all().await.unwrap_err();
        assert!(err.to_string().contains("bad: Channel error: login refused"));
        assert!(good.started.load(Ordering::SeqCst));
        assert!(!skipped.started.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_empty_manager_starts() {
        let manager = ChannelManager::new();
        assert!(manager.is_empty());
        assert!(manager.start_all().await.is_ok());
        assert!(manager.stop_all().await.is_ok());
    }
}
